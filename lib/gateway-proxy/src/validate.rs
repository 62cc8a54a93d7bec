//! Asynchronous client for the auth validation service

use anyhow::{anyhow, Result};
use gateway_api::{ApiResponse, AuthorizationRequest, Principal};
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;
use tracing::{debug, warn};

/// Client for the auth service's per-request validation endpoint.
///
/// One instance is shared by every gate invocation; the underlying reqwest
/// client pools connections. The validation exchange is bounded by an
/// explicit timeout; this call sits on the hot path of every proxied
/// request and must never stall it indefinitely.
pub struct AuthServiceClient {
    client: reqwest::Client,
    base_url: String,
    validate_timeout: Duration,
}

impl AuthServiceClient {
    /// Build a client for the given auth service base URL.
    pub fn new(base_url: impl Into<String>, validate_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(validate_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            validate_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate a bearer token against the resource the caller is accessing.
    ///
    /// Returns the decoded envelope on a 2xx response. Every other outcome
    /// (connection failure, non-success status, undecodable body, timeout)
    /// is an error; the caller treats them all the same way.
    pub async fn validate(
        &self,
        token: &str,
        request: &AuthorizationRequest,
    ) -> Result<ApiResponse<Principal>> {
        let url = format!("{}/resource/validate", self.base_url);
        debug!(resource_uri = %request.resource_uri, "Validating credential upstream");

        let call = async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(token)
                .json(request)
                .send()
                .await?
                .error_for_status()?;

            let envelope = response.json::<ApiResponse<Principal>>().await?;
            Ok::<_, anyhow::Error>(envelope)
        };

        match tokio_timeout(self.validate_timeout, call).await {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(
                    "Validation call timed out after {}ms",
                    self.validate_timeout.as_millis()
                );
                Err(anyhow!(
                    "validation call timed out after {}ms",
                    self.validate_timeout.as_millis()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client =
            AuthServiceClient::new("http://localhost:6094/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:6094");
    }
}
