//! Authentication DTOs exchanged with the auth service

use serde::{Deserialize, Serialize};

/// Outbound payload for the per-request validation call. One per inbound
/// request that carries a bearer credential.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// Path the caller tried to access, e.g. `/api/v1/account`
    pub resource_uri: String,
}

/// Verified identity returned by the auth service. Ephemeral; used only to
/// enrich the forwarded request, never persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[serde(default)]
    pub user_id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
}

/// Credentials posted to the passthrough authenticate endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequest {
    pub username: String,
    pub password: String,
}

/// Outcome payload of the passthrough authenticate call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub auth_message: String,
    pub is_authenticated: bool,
}
