//! Canned HTTP responses used across the request pipeline

use hyper::{body::Bytes, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// 401 with an empty body; the gate never explains a denial.
pub fn unauthorized_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// 403 with an empty body.
pub fn forbidden_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::FORBIDDEN)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Create a 404 Not Found response
pub fn not_found_response(reason: &str) -> Response<Full<Bytes>> {
    let body = Bytes::from(format!("Not Found: {}\n", reason));
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Full::new(body))
        .unwrap()
}

/// Create a 400 Bad Request response
pub fn bad_request_response(reason: &str) -> Response<Full<Bytes>> {
    let body = Bytes::from(format!("Bad Request: {}\n", reason));
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .body(Full::new(body))
        .unwrap()
}

/// Create a 500 Internal Server Error response
pub fn internal_error_response(reason: &str) -> Response<Full<Bytes>> {
    let body = Bytes::from(format!("Internal Server Error: {}\n", reason));
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(Full::new(body))
        .unwrap()
}

/// Serialize a value as a JSON response with the given status.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(bytes)))
            .unwrap(),
        Err(e) => internal_error_response(&format!("response serialization failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_denials_have_empty_bodies() {
        assert_eq!(unauthorized_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_not_found_response() {
        let response = not_found_response("no route matched /nope");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_json_response_sets_content_type() {
        let response = json_response(StatusCode::OK, &serde_json::json!({"ok": true}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }
}
