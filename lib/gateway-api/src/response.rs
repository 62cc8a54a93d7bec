//! JSON response envelope spoken on the auth-service boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic API envelope: `{timestamp, message, status, statusCode, payload}`.
///
/// The auth service wraps every response in this shape; the gateway builds
/// the same envelope for its own passthrough error responses. Parsing is
/// lenient: only `payload` matters to the authentication gate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub payload: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Build an envelope for a failure outcome.
    pub fn failure(status: &str, status_code: u16, message: &str, payload: T) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.to_string(),
            status: status.to_string(),
            status_code,
            payload: Some(payload),
        }
    }
}
