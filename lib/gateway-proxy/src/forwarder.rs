//! Thin HTTP request forwarding for the dispatch stage
//!
//! Deliberately minimal: pooled connections, hop-by-hop header stripping,
//! a bounded timeout. Load balancing, retries, and TLS belong to a real
//! dispatch engine, not this gateway.

use anyhow::Result;
use hyper::{body::Bytes, Request, Response, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::tokio::TokioExecutor;
use http_body_util::{BodyExt, Full};
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;
use tracing::{debug, warn};

/// HTTP request forwarder with connection pooling and timeout support.
pub struct RequestForwarder {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl RequestForwarder {
    /// Create a forwarder with connection pooling.
    pub fn new(timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        connector.set_keepalive(Some(Duration::from_secs(30)));

        let client = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(connector);

        Self { client, timeout }
    }

    /// Compose the upstream URL for a matched route: the route's target base
    /// (scheme, authority, and any base path) plus the inbound path and
    /// query.
    pub fn compose_target(target_uri: &Uri, path_and_query: &str) -> String {
        let scheme = target_uri.scheme_str().unwrap_or("http");
        let authority = target_uri
            .authority()
            .map(|a| a.as_str())
            .unwrap_or_default();
        let base_path = target_uri.path().trim_end_matches('/');
        format!("{}://{}{}{}", scheme, authority, base_path, path_and_query)
    }

    /// Forward a request to a target URL and return the collected response.
    pub async fn forward(
        &self,
        target_url: &str,
        request: Request<hyper::body::Incoming>,
    ) -> Result<Response<Bytes>> {
        debug!("Forwarding request to: {}", target_url);

        let uri: Uri = target_url.parse()?;

        let (mut parts, incoming) = request.into_parts();
        let body_bytes = Self::collect_body(incoming).await?;

        // Strip hop-by-hop headers before handing the request upstream.
        let mut filtered_headers = hyper::header::HeaderMap::new();
        for (name, value) in parts.headers.iter() {
            if !Self::is_hop_by_hop_header(name.as_str().to_lowercase().as_str()) {
                filtered_headers.insert(name.clone(), value.clone());
            }
        }
        parts.headers = filtered_headers;
        parts.uri = uri;

        let forwarded_request = Request::from_parts(parts, Full::new(body_bytes));

        match tokio_timeout(self.timeout, self.client.request(forwarded_request)).await {
            Ok(Ok(response)) => {
                debug!("Upstream responded with status: {}", response.status());

                let (response_parts, body) = response.into_parts();
                let response_bytes = Self::collect_body(body).await?;

                Ok(Response::from_parts(response_parts, response_bytes))
            }
            Ok(Err(e)) => {
                warn!("Upstream request error: {}", e);
                Ok(Self::error_response(
                    StatusCode::BAD_GATEWAY,
                    "Error communicating with upstream service",
                ))
            }
            Err(_) => {
                warn!("Upstream request timeout after {}s", self.timeout.as_secs());
                Ok(Self::error_response(
                    StatusCode::GATEWAY_TIMEOUT,
                    "Upstream service request timeout",
                ))
            }
        }
    }

    /// Collect an entire body into Bytes.
    async fn collect_body<B>(body: B) -> Result<Bytes>
    where
        B: hyper::body::Body,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let collected = body.collect().await?;
        Ok(collected.to_bytes())
    }

    fn error_response(status: StatusCode, message: &str) -> Response<Bytes> {
        Response::builder()
            .status(status)
            .body(Bytes::from(format!("{}\n", message)))
            .unwrap()
    }

    /// Check if header is hop-by-hop (should not be forwarded)
    fn is_hop_by_hop_header(name: &str) -> bool {
        matches!(
            name,
            "connection"
                | "keep-alive"
                | "proxy-authenticate"
                | "proxy-authorization"
                | "te"
                | "trailers"
                | "transfer-encoding"
                | "upgrade"
        )
    }
}
