//! Dynamic route provider backed by the route store

use crate::translate::translate_route;
use crate::{Result, RouteStore};
use gateway_api::RouteDefinition;
use std::sync::Arc;
use tracing::{debug, warn};

/// Exposes the current route table to the dispatch stage.
///
/// Pull model: every call to `current_routes` reads the backing store fresh
/// and returns its own consistent snapshot. No table lock, no cache, at the
/// cost of a store round-trip per fetch. Record order is preserved because
/// there is no explicit priority field; iteration order encodes match
/// precedence for first-match-wins dispatch.
pub struct DynamicRouteProvider {
    store: Arc<dyn RouteStore>,
}

impl DynamicRouteProvider {
    pub fn new(store: Arc<dyn RouteStore>) -> Self {
        Self { store }
    }

    /// Build the current route table from enabled records.
    ///
    /// A record that fails translation is excluded from this snapshot and
    /// logged; one malformed row never takes the rest of the table offline.
    /// A store failure propagates to the caller uncached; there is no
    /// fallback to a stale table.
    pub async fn current_routes(&self) -> Result<Vec<RouteDefinition>> {
        let records = self.store.find_enabled().await?;
        debug!("Fetched {} enabled route records", records.len());

        let mut definitions = Vec::with_capacity(records.len());
        for record in &records {
            match translate_route(record) {
                Ok(definition) => definitions.push(definition),
                Err(e) => warn!("Excluding route from table: {}", e),
            }
        }

        Ok(definitions)
    }

    /// Part of the exposed contract, but a no-op write path: routes are
    /// managed by direct writes to the backing store, not through this API.
    pub async fn save(&self, definition: RouteDefinition) -> Result<()> {
        warn!(
            route_id = %definition.id,
            "Route save is not supported here; write to the backing store instead"
        );
        Ok(())
    }

    /// No-op counterpart to `save`; see its note.
    pub async fn delete(&self, route_id: &str) -> Result<()> {
        warn!(
            route_id = %route_id,
            "Route delete is not supported here; write to the backing store instead"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryRouteStore, UnavailableRouteStore};
    use crate::CoreError;
    use gateway_api::RouteRecord;

    fn record(id: &str, uri: &str, enabled: bool) -> RouteRecord {
        RouteRecord {
            route_id: id.to_string(),
            uri: uri.to_string(),
            predicates: format!("/api/v1/{}/**", id),
            filters: None,
            enabled,
        }
    }

    fn provider(records: Vec<RouteRecord>) -> DynamicRouteProvider {
        DynamicRouteProvider::new(Arc::new(InMemoryRouteStore::with_records(records)))
    }

    #[tokio::test]
    async fn test_current_routes_excludes_disabled_records() {
        let provider = provider(vec![
            record("account", "http://localhost:6092", true),
            record("billing", "http://localhost:6093", false),
        ]);

        let routes = provider.current_routes().await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id, "account");
    }

    #[tokio::test]
    async fn test_current_routes_preserves_record_order() {
        let provider = provider(vec![
            record("catch-all", "http://localhost:6099", true),
            record("account", "http://localhost:6092", true),
        ]);

        let routes = provider.current_routes().await.unwrap();
        let ids: Vec<&str> = routes.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["catch-all", "account"]);
    }

    #[tokio::test]
    async fn test_current_routes_excludes_malformed_record() {
        let provider = provider(vec![
            record("account", "http://localhost:6092", true),
            record("broken", "not a uri at all", true),
            record("billing", "http://localhost:6093", true),
        ]);

        let routes = provider.current_routes().await.unwrap();
        let ids: Vec<&str> = routes.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["account", "billing"]);
    }

    #[tokio::test]
    async fn test_current_routes_is_idempotent_on_unchanged_store() {
        let provider = provider(vec![
            record("account", "http://localhost:6092", true),
            record("billing", "http://localhost:6093", true),
        ]);

        let first = provider.current_routes().await.unwrap();
        let second = provider.current_routes().await.unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.target_uri, b.target_uri);
            assert_eq!(a.predicates, b.predicates);
            assert_eq!(a.filters, b.filters);
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let provider = DynamicRouteProvider::new(Arc::new(UnavailableRouteStore));
        let err = provider.current_routes().await.unwrap_err();
        assert!(matches!(err, CoreError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_save_and_delete_are_no_ops() {
        let store = Arc::new(InMemoryRouteStore::with_records(vec![record(
            "account",
            "http://localhost:6092",
            true,
        )]));
        let provider = DynamicRouteProvider::new(store.clone());

        let definition = provider.current_routes().await.unwrap().remove(0);
        provider.save(definition).await.unwrap();
        provider.delete("account").await.unwrap();

        // The backing store is untouched either way.
        assert_eq!(store.len().await, 1);
        assert_eq!(provider.current_routes().await.unwrap().len(), 1);
    }
}
