//! In-memory store driver
//!
//! Process-local driver backed by concurrent hash maps. Useful for tests
//! and as a default where persistence is not required. Reports no predicate
//! pushdown, so it exercises the repository's in-process filter path.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use ovs_domain::error::Result;
use ovs_domain::ports::store::{Predicate, ScanStream, StoreDriver};
use ovs_domain::registry::{DriverConfig, STORE_DRIVERS, StoreDriverEntry};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory store driver
///
/// Stores payloads in concurrent hash maps keyed by collection and
/// identity. Scans yield a point-in-time snapshot in key order.
#[derive(Default)]
pub struct MemoryDriver {
    collections: DashMap<String, DashMap<String, Value>>,
    connected: AtomicBool,
}

impl MemoryDriver {
    /// Create a new in-memory driver
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `connect` has been called without a matching `close`
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of payloads stored in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Whether a collection holds no payloads
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl StoreDriver for MemoryDriver {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|entries| entries.get(id).map(|entry| entry.value().clone())))
    }

    async fn write(&self, collection: &str, id: &str, payload: &Value) -> Result<()> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), payload.clone());
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|entries| entries.remove(id))
            .is_some())
    }

    async fn scan(&self, collection: &str, _predicate: Option<&Predicate>) -> Result<ScanStream> {
        // Point-in-time snapshot; key order for deterministic iteration
        let mut items: Vec<(String, Value)> = self
            .collections
            .get(collection)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (entry.key().clone(), entry.value().clone()))
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(futures::stream::iter(items.into_iter().map(Ok)).boxed())
    }

    fn driver_name(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDriver")
            .field("collections", &self.collections.len())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[linkme::distributed_slice(STORE_DRIVERS)]
static MEMORY_DRIVER: StoreDriverEntry = StoreDriverEntry {
    name: "memory",
    description: "Process-local in-memory store",
    factory: |_config: &DriverConfig| Ok(Arc::new(MemoryDriver::new())),
};
