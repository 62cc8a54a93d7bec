//! Passthrough authenticate relay and its error mapping
//!
//! The gateway exposes `POST /artemis/authenticate` itself and relays the
//! credentials to the auth service. Failure mapping is deliberately narrow:
//! an upstream 401 keeps its status, everything else collapses to 500.

use anyhow::Result;
use gateway_api::{ApiResponse, AuthenticationRequest, AuthenticationResponse};
use hyper::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout as tokio_timeout;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PassthroughError {
    #[error("authentication rejected upstream")]
    Unauthorized,

    #[error("authentication relay failed: {0}")]
    Upstream(String),
}

/// Relay client for the auth service's authenticate endpoint.
pub struct AuthPassthrough {
    client: reqwest::Client,
    base_url: String,
    call_timeout: Duration,
}

impl AuthPassthrough {
    pub fn new(base_url: impl Into<String>, call_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(call_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            call_timeout,
        })
    }

    /// Relay credentials upstream and hand back the upstream envelope.
    pub async fn authenticate(
        &self,
        request: &AuthenticationRequest,
    ) -> std::result::Result<ApiResponse<AuthenticationResponse>, PassthroughError> {
        let url = format!("{}/artemis/authenticate", self.base_url);
        debug!(username = %request.username, "Relaying authenticate call");

        let call = self.client.post(&url).json(request).send();

        let response = match tokio_timeout(self.call_timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(PassthroughError::Upstream(e.to_string())),
            Err(_) => {
                return Err(PassthroughError::Upstream(format!(
                    "authenticate call timed out after {}ms",
                    self.call_timeout.as_millis()
                )))
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PassthroughError::Unauthorized);
        }
        if !status.is_success() {
            return Err(PassthroughError::Upstream(format!(
                "upstream returned {}",
                status
            )));
        }

        response
            .json::<ApiResponse<AuthenticationResponse>>()
            .await
            .map_err(|e| PassthroughError::Upstream(e.to_string()))
    }
}

/// Map a relay failure to the gateway's error envelope.
///
/// Exactly two branches: upstream 401 keeps its status and message, and the
/// default arm answers 500, which also covers network failures, timeouts,
/// and upstream 5xx.
pub fn error_envelope(
    error: &PassthroughError,
) -> (StatusCode, ApiResponse<AuthenticationResponse>) {
    let failed = AuthenticationResponse {
        auth_message: "Authentication Failed".to_string(),
        is_authenticated: false,
    };

    match error {
        PassthroughError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            ApiResponse::failure("UNAUTHORIZED", 401, "UNAUTHORIZED", failed),
        ),
        PassthroughError::Upstream(reason) => {
            warn!("Authenticate relay failure: {}", reason);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure(
                    "INTERNAL_SERVER_ERROR",
                    500,
                    "Unknown exception occurred",
                    failed,
                ),
            )
        }
    }
}
