//! Per-request authentication gate
//!
//! Gates every routed request: extracts the bearer credential, validates it
//! against the auth service, and either forwards an identity-enriched
//! request or terminates with a denial. Ambiguous outcomes deny: the gate
//! fails closed.

use crate::http::{forbidden_response, unauthorized_response};
use crate::validate::AuthServiceClient;
use anyhow::Result;
use gateway_api::{AuthorizationRequest, Principal};
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use hyper::{Request, Response};
use http_body_util::Full;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header names under which verified identity is forwarded downstream.
/// The set is configuration, not code: deployments choose the names.
#[derive(Clone, Debug)]
pub struct IdentityHeaders {
    pub user_id: HeaderName,
    pub username: HeaderName,
    pub service_id: HeaderName,
    pub account_type: HeaderName,
}

impl IdentityHeaders {
    /// Parse configured header names, rejecting anything that is not a
    /// valid HTTP header name at startup rather than per request.
    pub fn new(
        user_id: &str,
        username: &str,
        service_id: &str,
        account_type: &str,
    ) -> Result<Self> {
        Ok(Self {
            user_id: HeaderName::try_from(user_id)?,
            username: HeaderName::try_from(username)?,
            service_id: HeaderName::try_from(service_id)?,
            account_type: HeaderName::try_from(account_type)?,
        })
    }
}

impl Default for IdentityHeaders {
    fn default() -> Self {
        Self {
            user_id: HeaderName::from_static("x-user-id"),
            username: HeaderName::from_static("x-user-name"),
            service_id: HeaderName::from_static("x-service-id"),
            account_type: HeaderName::from_static("x-account-type"),
        }
    }
}

/// Outcome of gating one request.
pub enum GateDecision<B> {
    /// Credential verified; the request now carries identity headers.
    Forward(Request<B>),
    /// Terminal denial; nothing was forwarded.
    Deny(Response<Full<Bytes>>),
}

impl<B> GateDecision<B> {
    pub fn is_forward(&self) -> bool {
        matches!(self, GateDecision::Forward(_))
    }
}

/// The authentication gate applied ahead of dispatch.
///
/// Holds no mutable state; concurrent invocations never interfere. The only
/// side effects are the outbound validation call and, on success, header
/// mutation of the forwarded request.
pub struct AuthGate {
    client: Arc<AuthServiceClient>,
    headers: IdentityHeaders,
}

impl AuthGate {
    pub fn new(client: Arc<AuthServiceClient>, headers: IdentityHeaders) -> Self {
        Self { client, headers }
    }

    /// Gate one request. The body is never read; denial responses carry a
    /// bare status, matching the fail-closed policy of not explaining
    /// failures to unauthenticated callers.
    pub async fn apply<B>(&self, mut request: Request<B>) -> GateDecision<B> {
        let path = request.uri().path().to_string();

        // Local check first: a missing or malformed credential never
        // reaches the network.
        let token = match bearer_token(request.headers()) {
            Some(token) => token.to_string(),
            None => {
                warn!(path = %path, "Invalid or missing Authorization header");
                return GateDecision::Deny(unauthorized_response());
            }
        };

        let authorization = AuthorizationRequest {
            resource_uri: path.clone(),
        };

        match self.client.validate(&token, &authorization).await {
            Ok(envelope) => match envelope.payload {
                Some(principal) => {
                    debug!(path = %path, username = %principal.username, "Request authenticated");
                    self.enrich(request.headers_mut(), &principal);
                    GateDecision::Forward(request)
                }
                None => {
                    warn!(path = %path, "Credential rejected upstream");
                    GateDecision::Deny(forbidden_response())
                }
            },
            // Network failure, non-success status, bad body, timeout: all
            // denied alike. The caller cannot tell "invalid token" from
            // "auth service down".
            Err(e) => {
                warn!(path = %path, "Error while validating request: {}", e);
                GateDecision::Deny(unauthorized_response())
            }
        }
    }

    /// Stamp the verified principal onto the forwarded request. Username is
    /// always present; the remaining fields forward when the principal
    /// carries them.
    fn enrich(&self, headers: &mut HeaderMap, principal: &Principal) {
        set_header(headers, &self.headers.username, &principal.username);
        if let Some(user_id) = &principal.user_id {
            set_header(headers, &self.headers.user_id, user_id);
        }
        if let Some(service_id) = &principal.service_id {
            set_header(headers, &self.headers.service_id, service_id);
        }
        if let Some(account_type) = &principal.account_type {
            set_header(headers, &self.headers.account_type, account_type);
        }
    }
}

fn set_header(headers: &mut HeaderMap, name: &HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name.clone(), value);
        }
        Err(_) => warn!(header = %name, "Dropping identity header with non-ASCII value"),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gate_for(server_uri: &str, timeout: Duration) -> AuthGate {
        let client = AuthServiceClient::new(server_uri, timeout).unwrap();
        AuthGate::new(Arc::new(client), IdentityHeaders::default())
    }

    fn request(auth_header: Option<&str>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().uri("/api/v1/account");
        if let Some(value) = auth_header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn principal_envelope() -> serde_json::Value {
        json!({
            "timestamp": "2025-04-21T12:00:00Z",
            "message": "OK",
            "status": "OK",
            "statusCode": 200,
            "payload": {
                "userId": "u-100",
                "username": "balaji",
                "serviceId": "account-service",
                "accountType": "premium"
            }
        })
    }

    #[tokio::test]
    async fn test_missing_header_denies_locally_without_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resource/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(principal_envelope()))
            .expect(0)
            .mount(&server)
            .await;

        let gate = gate_for(&server.uri(), Duration::from_secs(1));
        match gate.apply(request(None)).await {
            GateDecision::Deny(response) => {
                assert_eq!(response.status(), hyper::StatusCode::UNAUTHORIZED)
            }
            GateDecision::Forward(_) => panic!("must not forward without a credential"),
        }
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_denies_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(principal_envelope()))
            .expect(0)
            .mount(&server)
            .await;

        let gate = gate_for(&server.uri(), Duration::from_secs(1));
        let decision = gate.apply(request(Some("Basic dXNlcjpwdw=="))).await;
        assert!(!decision.is_forward());
    }

    #[tokio::test]
    async fn test_valid_token_forwards_with_identity_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resource/validate"))
            .and(header("Authorization", "Bearer abc"))
            .and(body_json(json!({"resourceUri": "/api/v1/account"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(principal_envelope()))
            .expect(1)
            .mount(&server)
            .await;

        let gate = gate_for(&server.uri(), Duration::from_secs(1));
        match gate.apply(request(Some("Bearer abc"))).await {
            GateDecision::Forward(forwarded) => {
                let headers = forwarded.headers();
                assert_eq!(headers.get("x-user-name").unwrap(), "balaji");
                assert_eq!(headers.get("x-user-id").unwrap(), "u-100");
                assert_eq!(headers.get("x-service-id").unwrap(), "account-service");
                assert_eq!(headers.get("x-account-type").unwrap(), "premium");
            }
            GateDecision::Deny(response) => {
                panic!("expected forward, got denial {}", response.status())
            }
        }
    }

    #[tokio::test]
    async fn test_null_principal_is_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resource/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timestamp": "2025-04-21T12:00:00Z",
                "message": "denied",
                "status": "FORBIDDEN",
                "statusCode": 403,
                "payload": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gate = gate_for(&server.uri(), Duration::from_secs(1));
        match gate.apply(request(Some("Bearer abc"))).await {
            GateDecision::Deny(response) => {
                assert_eq!(response.status(), hyper::StatusCode::FORBIDDEN)
            }
            GateDecision::Forward(_) => panic!("null principal must not forward"),
        }
    }

    #[tokio::test]
    async fn test_upstream_error_fails_closed_as_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resource/validate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let gate = gate_for(&server.uri(), Duration::from_secs(1));
        match gate.apply(request(Some("Bearer abc"))).await {
            GateDecision::Deny(response) => {
                assert_eq!(response.status(), hyper::StatusCode::UNAUTHORIZED)
            }
            GateDecision::Forward(_) => panic!("upstream error must not forward"),
        }
    }

    #[tokio::test]
    async fn test_upstream_timeout_fails_closed_as_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resource/validate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(principal_envelope())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let gate = gate_for(&server.uri(), Duration::from_millis(200));
        match gate.apply(request(Some("Bearer abc"))).await {
            GateDecision::Deny(response) => {
                assert_eq!(response.status(), hyper::StatusCode::UNAUTHORIZED)
            }
            GateDecision::Forward(_) => panic!("timeout must not forward"),
        }
    }

    #[tokio::test]
    async fn test_malformed_upstream_body_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resource/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let gate = gate_for(&server.uri(), Duration::from_secs(1));
        let decision = gate.apply(request(Some("Bearer abc"))).await;
        assert!(!decision.is_forward());
    }
}
