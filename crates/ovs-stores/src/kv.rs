//! Redis key-value store driver
//!
//! Maps collections onto a key namespace: each payload lives under
//! `<namespace>:<collection>:<id>` as serialized JSON. The backend cannot
//! evaluate predicates, so scans return everything and filtering happens
//! in-process.

use async_trait::async_trait;
use futures::StreamExt;
use ovs_domain::error::{Error, Result};
use ovs_domain::ports::store::{Predicate, ScanStream, StoreDriver};
use ovs_domain::registry::{DriverConfig, STORE_DRIVERS, StoreDriverEntry};
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Redis key-value store driver
///
/// Uses multiplexed connections for efficient connection reuse. Suitable
/// when multiple instances need to share the same store.
#[derive(Clone)]
pub struct RedisKvDriver {
    client: Client,
    namespace: String,
}

impl RedisKvDriver {
    /// Create a new Redis driver with a connection string and key namespace
    ///
    /// # Arguments
    ///
    /// * `connection_string` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `namespace` - prefix isolating this deployment's keys
    pub fn new(connection_string: &str, namespace: &str) -> Result<Self> {
        let client = Client::open(connection_string).map_err(|e| {
            Error::connection_with_source(format!("Failed to create Redis client: {e}"), e)
        })?;

        Ok(Self {
            client,
            namespace: namespace.to_string(),
        })
    }

    /// Get a connection from the pool
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                Error::connection_with_source(format!("Failed to get Redis connection: {e}"), e)
            })
    }

    /// Full key for a payload: `<namespace>:<collection>:<id>`
    pub fn storage_key(&self, collection: &str, id: &str) -> String {
        format!("{}:{}:{}", self.namespace, collection, id)
    }

    fn match_pattern(&self, collection: &str) -> String {
        format!("{}:{}:*", self.namespace, collection)
    }

    /// Strip the namespace and collection prefix back off a stored key
    fn identity_of<'k>(&self, collection: &str, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(&format!("{}:{}:", self.namespace, collection))
    }
}

#[async_trait]
impl StoreDriver for RedisKvDriver {
    async fn connect(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::connection_with_source(format!("Redis PING failed: {e}"), e))?;
        debug!(namespace = %self.namespace, "redis driver connected");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // Multiplexed connections close when the client is dropped
        Ok(())
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let mut conn = self.get_connection().await?;
        let key = self.storage_key(collection, id);

        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| Error::store_with_source(format!("Redis GET failed: {e}"), e))?;

        match raw {
            Some(json) => {
                let value = serde_json::from_str(&json).map_err(|e| {
                    Error::store_with_source(format!("Corrupt payload under key {key}"), e)
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn write(&self, collection: &str, id: &str, payload: &Value) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key = self.storage_key(collection, id);
        let json = serde_json::to_string(payload)?;

        conn.set::<_, _, ()>(&key, json)
            .await
            .map_err(|e| Error::store_with_source(format!("Redis SET failed: {e}"), e))
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let key = self.storage_key(collection, id);

        let deleted: i32 = conn
            .del(&key)
            .await
            .map_err(|e| Error::store_with_source(format!("Redis DEL failed: {e}"), e))?;
        Ok(deleted > 0)
    }

    async fn scan(&self, collection: &str, _predicate: Option<&Predicate>) -> Result<ScanStream> {
        let mut conn = self.get_connection().await?;
        let pattern = self.match_pattern(collection);

        // SCAN the keyspace first; the cursor walk is safe against
        // concurrent writers, unlike KEYS
        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::store_with_source(format!("Redis SCAN failed: {e}"), e))?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        keys.sort();

        let mut items: Vec<(String, Value)> = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(id) = self.identity_of(collection, &key) else {
                continue;
            };
            let raw: Option<String> = conn
                .get(&key)
                .await
                .map_err(|e| Error::store_with_source(format!("Redis GET failed: {e}"), e))?;
            // Expired or deleted since the SCAN; skip it
            let Some(json) = raw else {
                continue;
            };
            let value = serde_json::from_str(&json).map_err(|e| {
                Error::store_with_source(format!("Corrupt payload under key {key}"), e)
            })?;
            items.push((id.to_string(), value));
        }

        Ok(futures::stream::iter(items.into_iter().map(Ok)).boxed())
    }

    fn driver_name(&self) -> &str {
        "kv"
    }
}

impl std::fmt::Debug for RedisKvDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKvDriver")
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[linkme::distributed_slice(STORE_DRIVERS)]
static KV_DRIVER: StoreDriverEntry = StoreDriverEntry {
    name: "kv",
    description: "Redis key-value store",
    factory: |config: &DriverConfig| {
        let uri = config
            .uri
            .clone()
            .unwrap_or_else(|| "redis://localhost:6379".to_string());
        let namespace = config.namespace.clone().unwrap_or_else(|| "ovs".to_string());

        let driver = RedisKvDriver::new(&uri, &namespace)
            .map_err(|e| format!("Failed to create Redis driver: {e}"))?;
        Ok(Arc::new(driver))
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_format() {
        let driver = RedisKvDriver::new("redis://localhost:6379", "ovs").unwrap();
        assert_eq!(driver.storage_key("players", "abc"), "ovs:players:abc");
    }

    #[test]
    fn test_identity_round_trip() {
        let driver = RedisKvDriver::new("redis://localhost:6379", "ovs").unwrap();
        let key = driver.storage_key("players", "abc-123");
        assert_eq!(driver.identity_of("players", &key), Some("abc-123"));
        assert_eq!(driver.identity_of("banks", &key), None);
    }
}
