//! PostgreSQL route store implementation

use async_trait::async_trait;
use gateway_api::RouteRecord;
use gateway_core::{CoreError, RouteStore};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use tracing::{debug, info};

use crate::error::Result;

/// Route records live in a single table; `id` is the insertion-ordered
/// primary key and doubles as match precedence, since records carry no
/// explicit priority.
const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS route (
    id          SERIAL PRIMARY KEY,
    route_id    VARCHAR(64)  NOT NULL UNIQUE,
    uri         VARCHAR(255) NOT NULL,
    predicates  VARCHAR(255) NOT NULL,
    filters     VARCHAR(255),
    enabled     BOOLEAN      NOT NULL DEFAULT TRUE
)";

const FIND_ENABLED_SQL: &str = "\
SELECT route_id, uri, predicates, filters, enabled
FROM route
WHERE enabled
ORDER BY id";

/// `RouteStore` backed by a PostgreSQL table.
pub struct PgRouteStore {
    pool: PgPool,
}

impl PgRouteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the route table when absent. Safe to call on every boot.
    pub async fn ensure_schema(&self) -> Result<()> {
        query(SCHEMA_SQL).execute(&self.pool).await?;
        info!("Route table schema verified");
        Ok(())
    }

    async fn fetch_enabled(&self) -> Result<Vec<RouteRecord>> {
        let rows: Vec<(String, String, String, Option<String>, bool)> =
            query_as(FIND_ENABLED_SQL).fetch_all(&self.pool).await?;

        debug!("Route query returned {} enabled rows", rows.len());

        Ok(rows
            .into_iter()
            .map(|(route_id, uri, predicates, filters, enabled)| RouteRecord {
                route_id,
                uri,
                predicates,
                filters,
                enabled,
            })
            .collect())
    }
}

#[async_trait]
impl RouteStore for PgRouteStore {
    async fn find_enabled(&self) -> gateway_core::Result<Vec<RouteRecord>> {
        self.fetch_enabled()
            .await
            .map_err(|e| CoreError::StoreUnavailable(e.to_string()))
    }
}
