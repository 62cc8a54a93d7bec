//! PostgreSQL backing store for route records
//!
//! Provides the persistent `RouteStore` implementation: connection pool
//! construction, idempotent schema bootstrap, and the enabled-record query.

pub mod config;
pub mod error;
pub mod pool;
pub mod postgres;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use pool::create_pool;
pub use postgres::PgRouteStore;
