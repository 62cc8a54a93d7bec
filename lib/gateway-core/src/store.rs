//! Route store contract and in-memory implementation

use crate::{CoreError, Result};
use async_trait::async_trait;
use gateway_api::RouteRecord;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// CRUD boundary over persisted route records.
///
/// The order returned by `find_enabled` encodes match precedence: the
/// dispatch stage applies first-match-wins over it. Implementations must
/// return a fresh read per call; the provider never caches a snapshot.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// All records with `enabled = true`, in store order.
    async fn find_enabled(&self) -> Result<Vec<RouteRecord>>;
}

/// In-memory route store guarding an ordered record list.
///
/// Used as the test double and as the fallback backing store when no
/// database is configured. Insertion order is preserved, so `put` order is
/// match precedence.
pub struct InMemoryRouteStore {
    records: Arc<RwLock<Vec<RouteRecord>>>,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Seed a store from an ordered record list.
    pub fn with_records(records: Vec<RouteRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Insert or replace a record, keyed by route id. Replacement keeps the
    /// record's original position.
    pub async fn put(&self, record: RouteRecord) {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.route_id == record.route_id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        debug!("Route store now holds {} records", records.len());
    }

    /// Remove a record by route id.
    pub async fn remove(&self, route_id: &str) {
        let mut records = self.records.write().await;
        records.retain(|r| r.route_id != route_id);
    }

    /// Number of records, enabled or not.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryRouteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn find_enabled(&self) -> Result<Vec<RouteRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.enabled).cloned().collect())
    }
}

/// A store that always fails. Lets tests exercise the propagation path for
/// an unreachable backing store.
pub struct UnavailableRouteStore;

#[async_trait]
impl RouteStore for UnavailableRouteStore {
    async fn find_enabled(&self) -> Result<Vec<RouteRecord>> {
        Err(CoreError::StoreUnavailable(
            "backing store not reachable".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, enabled: bool) -> RouteRecord {
        RouteRecord {
            route_id: id.to_string(),
            uri: format!("http://{}:8080", id),
            predicates: format!("/api/v1/{}/**", id),
            filters: None,
            enabled,
        }
    }

    #[tokio::test]
    async fn test_find_enabled_filters_disabled_records() {
        let store = InMemoryRouteStore::with_records(vec![
            record("accounts", true),
            record("billing", false),
            record("users", true),
        ]);

        let enabled = store.find_enabled().await.unwrap();
        assert_eq!(enabled.len(), 2);
        assert!(enabled.iter().all(|r| r.enabled));
    }

    #[tokio::test]
    async fn test_find_enabled_preserves_order() {
        let store = InMemoryRouteStore::new();
        store.put(record("zeta", true)).await;
        store.put(record("alpha", true)).await;

        let enabled = store.find_enabled().await.unwrap();
        assert_eq!(enabled[0].route_id, "zeta");
        assert_eq!(enabled[1].route_id, "alpha");
    }

    #[tokio::test]
    async fn test_put_replaces_in_place() {
        let store = InMemoryRouteStore::new();
        store.put(record("accounts", true)).await;
        store.put(record("billing", true)).await;

        let mut updated = record("accounts", true);
        updated.uri = "http://accounts-v2:8080".to_string();
        store.put(updated).await;

        let enabled = store.find_enabled().await.unwrap();
        assert_eq!(enabled.len(), 2);
        assert_eq!(enabled[0].route_id, "accounts");
        assert_eq!(enabled[0].uri, "http://accounts-v2:8080");
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryRouteStore::with_records(vec![record("accounts", true)]);
        store.remove("accounts").await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unavailable_store_propagates_error() {
        let err = UnavailableRouteStore.find_enabled().await.unwrap_err();
        assert!(matches!(err, CoreError::StoreUnavailable(_)));
    }
}
