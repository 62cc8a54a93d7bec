//! Edge gateway API types
//!
//! This library defines the data model shared across the gateway:
//! - RouteRecord: persisted routing configuration rows
//! - RouteDefinition: runtime match-and-forward rules built from records
//! - Auth DTOs: validation request/response payloads and the verified Principal
//! - ApiResponse: the JSON envelope spoken on the auth-service boundary

pub mod auth;
pub mod response;
pub mod route;

pub use auth::{AuthenticationRequest, AuthenticationResponse, AuthorizationRequest, Principal};
pub use response::ApiResponse;
pub use route::{FilterSpec, PredicateSpec, RouteDefinition, RouteRecord};
