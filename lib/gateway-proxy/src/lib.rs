//! Request-path machinery for the edge gateway
//!
//! - Per-request authentication gate and the remote validation client
//! - Passthrough authenticate relay with its two-branch error mapping
//! - Thin request forwarder for the dispatch stage
//! - Observe-only middleware chain and Prometheus metrics

pub mod auth;
pub mod forwarder;
pub mod http;
pub mod metrics;
pub mod middleware;
pub mod passthrough;
pub mod validate;

pub use auth::{AuthGate, GateDecision, IdentityHeaders};
pub use forwarder::RequestForwarder;
pub use metrics::{MetricsCollector, MetricsMiddleware};
pub use middleware::{Middleware, MiddlewareChain, RequestContext, RequestLogMiddleware};
pub use passthrough::{error_envelope, AuthPassthrough, PassthroughError};
pub use validate::AuthServiceClient;
