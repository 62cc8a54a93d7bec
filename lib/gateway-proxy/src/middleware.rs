//! Observe-only middleware around the request pipeline
//!
//! Middleware here watches requests and responses for logging and metrics;
//! it cannot short-circuit. Gating decisions belong to the authentication
//! gate, which runs as its own stage ahead of dispatch.

use anyhow::Result;
use hyper::Request;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, span, Level};
use uuid::Uuid;

/// Context passed through the middleware chain, one per request.
#[derive(Clone)]
pub struct RequestContext {
    /// Correlation id attached to every log line for this request
    pub request_id: String,
    /// Request method
    pub method: String,
    /// Request path
    pub path: String,
    /// Custom metadata for middleware
    pub metadata: Arc<std::sync::Mutex<HashMap<String, String>>>,
}

impl RequestContext {
    /// Create a context from an inbound request.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            metadata: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Get a metadata value
    pub fn get_metadata(&self, key: &str) -> Option<String> {
        self.metadata.lock().ok().and_then(|m| m.get(key).cloned())
    }

    /// Set a metadata value
    pub fn set_metadata(&self, key: String, value: String) {
        if let Ok(mut m) = self.metadata.lock() {
            m.insert(key, value);
        }
    }
}

/// Middleware trait for observing requests and responses
#[async_trait::async_trait]
pub trait Middleware: Send + Sync {
    /// Name for logging
    fn name(&self) -> &'static str {
        "UnnamedMiddleware"
    }

    /// Called before the request enters the pipeline
    async fn on_request(&self, _context: &RequestContext) -> Result<()> {
        Ok(())
    }

    /// Called once the response status is known
    async fn on_response(&self, _context: &RequestContext, _status: u16) -> Result<()> {
        Ok(())
    }

    /// Called on pipeline error
    async fn on_error(&self, _context: &RequestContext, _error: &str) -> Result<()> {
        Ok(())
    }
}

/// Chain of middleware to execute in order
pub struct MiddlewareChain {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
        }
    }

    /// Add middleware to the chain
    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Process request through all middleware
    pub async fn on_request(&self, context: &RequestContext) -> Result<()> {
        for mw in &self.middleware {
            let span = span!(Level::DEBUG, "middleware", name = mw.name());
            let _guard = span.enter();
            mw.on_request(context).await?;
        }
        Ok(())
    }

    /// Process response through all middleware (in reverse order)
    pub async fn on_response(&self, context: &RequestContext, status: u16) -> Result<()> {
        for mw in self.middleware.iter().rev() {
            let span = span!(Level::DEBUG, "middleware", name = mw.name());
            let _guard = span.enter();
            mw.on_response(context, status).await?;
        }
        Ok(())
    }

    /// Process error through all middleware
    pub async fn on_error(&self, context: &RequestContext, error: &str) -> Result<()> {
        for mw in &self.middleware {
            mw.on_error(context, error).await?;
        }
        Ok(())
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs request start and completion with latency, keyed by request id.
pub struct RequestLogMiddleware;

#[async_trait::async_trait]
impl Middleware for RequestLogMiddleware {
    fn name(&self) -> &'static str {
        "RequestLogMiddleware"
    }

    async fn on_request(&self, context: &RequestContext) -> Result<()> {
        info!(
            request_id = %context.request_id,
            method = %context.method,
            path = %context.path,
            "Request started"
        );
        context.set_metadata(
            "start_time".to_string(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)?
                .as_millis()
                .to_string(),
        );
        Ok(())
    }

    async fn on_response(&self, context: &RequestContext, status: u16) -> Result<()> {
        let duration_ms = match context
            .get_metadata("start_time")
            .and_then(|s| s.parse::<u128>().ok())
        {
            Some(start) => std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)?
                .as_millis()
                .saturating_sub(start),
            None => 0,
        };

        info!(
            request_id = %context.request_id,
            method = %context.method,
            path = %context.path,
            status = status,
            duration_ms = duration_ms as u64,
            "Request completed"
        );
        Ok(())
    }

    async fn on_error(&self, context: &RequestContext, error: &str) -> Result<()> {
        debug!(
            request_id = %context.request_id,
            method = %context.method,
            path = %context.path,
            "Pipeline error: {}", error
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::Bytes;

    fn context() -> RequestContext {
        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/account")
            .body(Full::new(Bytes::new()))
            .unwrap();
        RequestContext::from_request(&request)
    }

    #[test]
    fn test_context_captures_method_and_path() {
        let context = context();
        assert_eq!(context.method, "GET");
        assert_eq!(context.path, "/api/v1/account");
        assert!(!context.request_id.is_empty());
    }

    #[test]
    fn test_context_metadata() {
        let context = context();
        context.set_metadata("key1".to_string(), "value1".to_string());
        assert_eq!(context.get_metadata("key1"), Some("value1".to_string()));
        assert_eq!(context.get_metadata("key2"), None);
    }

    #[tokio::test]
    async fn test_empty_chain_is_a_no_op() {
        let chain = MiddlewareChain::default();
        let context = context();
        assert!(chain.on_request(&context).await.is_ok());
        assert!(chain.on_response(&context, 200).await.is_ok());
        assert!(chain.on_error(&context, "boom").await.is_ok());
    }

    #[tokio::test]
    async fn test_request_log_middleware_records_start_time() {
        let middleware = RequestLogMiddleware;
        let context = context();
        middleware.on_request(&context).await.unwrap();
        assert!(context.get_metadata("start_time").is_some());
        middleware.on_response(&context, 200).await.unwrap();
    }
}
