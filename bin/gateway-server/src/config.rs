//! Gateway configuration loaded from environment variables
//!
//! Constructed once at startup and passed by reference into the components
//! that need it; nothing reads the environment after boot.

use std::time::Duration;

/// Configured names for the identity headers stamped onto forwarded
/// requests. Kept as raw strings here; the gate parses and validates them.
#[derive(Clone, Debug)]
pub struct IdentityHeaderNames {
    pub user_id: String,
    pub username: String,
    pub service_id: String,
    pub account_type: String,
}

/// Process-wide gateway configuration.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// TCP port to listen on
    pub port: u16,
    /// Auth service host
    pub auth_service_host: String,
    /// Auth service port
    pub auth_service_port: u16,
    /// Base path of the auth service's secured validation API
    pub auth_secured_path: String,
    /// Bound on the per-request validation call
    pub validate_timeout: Duration,
    /// Bound on upstream forwarding
    pub forward_timeout: Duration,
    /// Route store database; absent means the in-memory fallback
    pub database_url: Option<String>,
    pub identity_headers: IdentityHeaderNames,
}

impl GatewayConfig {
    /// Read configuration from the environment, with defaults suitable for
    /// local development.
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("GATEWAY_PORT", 8080),
            auth_service_host: env_or("AUTH_SERVICE_HOST", "localhost"),
            auth_service_port: env_parsed("AUTH_SERVICE_PORT", 6094),
            auth_secured_path: env_or("AUTH_SECURED_PATH", "/api/v1/artemis/auth/secured"),
            validate_timeout: Duration::from_secs(env_parsed("AUTH_VALIDATE_TIMEOUT_SECS", 5)),
            forward_timeout: Duration::from_secs(env_parsed("FORWARD_TIMEOUT_SECS", 30)),
            database_url: std::env::var("DATABASE_URL").ok(),
            identity_headers: IdentityHeaderNames {
                user_id: env_or("USER_ID_HEADER", "X-USER-ID"),
                username: env_or("USERNAME_HEADER", "X-USER-NAME"),
                service_id: env_or("SERVICE_ID_HEADER", "X-SERVICE-ID"),
                account_type: env_or("ACCOUNT_TYPE_HEADER", "X-ACCOUNT-TYPE"),
            },
        }
    }

    /// Base URL of the validation endpoint's secured API.
    pub fn validate_base(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.auth_service_host, self.auth_service_port, self.auth_secured_path
        )
    }

    /// Base URL for the passthrough authenticate relay.
    pub fn authenticate_base(&self) -> String {
        format!("http://{}:{}", self.auth_service_host, self.auth_service_port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_includes_secured_path() {
        let mut config = GatewayConfig::from_env();
        config.auth_service_host = "auth.internal".to_string();
        config.auth_service_port = 6094;
        config.auth_secured_path = "/api/v1/artemis/auth/secured".to_string();
        assert_eq!(
            config.validate_base(),
            "http://auth.internal:6094/api/v1/artemis/auth/secured"
        );
        assert_eq!(config.authenticate_base(), "http://auth.internal:6094");
    }
}
