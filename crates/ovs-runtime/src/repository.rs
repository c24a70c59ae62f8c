//! Generic entity repository
//!
//! Typed CRUD and query access over any registered store driver. The
//! repository serializes JSON payloads through the driver, keeps an
//! optional read cache in front of it, and serializes writes per identity
//! so concurrent saves of the same entity cannot interleave.

use dashmap::DashMap;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use moka::future::Cache;
use ovs_domain::entity::Entity;
use ovs_domain::error::{Error, Result};
use ovs_domain::ports::store::{Predicate, StoreDriver};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Lazy, single-pass sequence of query results.
///
/// Entities are pulled from the backend scan one at a time; dropping the
/// stream abandons the query and releases any backing cursor.
pub type EntityStream<E> = BoxStream<'static, Result<E>>;

/// Typed repository over a store driver
///
/// One repository serves one entity type; the collection name comes from
/// [`Entity::COLLECTION`]. Cheap to clone, and all clones share the same
/// cache and write locks.
pub struct Repository<E: Entity> {
    driver: Arc<dyn StoreDriver>,
    cache: Option<Cache<String, Value>>,
    write_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            cache: self.cache.clone(),
            write_locks: Arc::clone(&self.write_locks),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    /// Create a repository without a read cache
    pub fn new(driver: Arc<dyn StoreDriver>) -> Self {
        Self {
            driver,
            cache: None,
            write_locks: Arc::new(DashMap::new()),
            _entity: PhantomData,
        }
    }

    /// Create a repository with a bounded read cache.
    ///
    /// Without a TTL the cache is pure write-through: entries live until
    /// displaced by capacity or invalidated by a write.
    pub fn with_cache(driver: Arc<dyn StoreDriver>, capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            driver,
            cache: Some(builder.build()),
            write_locks: Arc::new(DashMap::new()),
            _entity: PhantomData,
        }
    }

    /// The driver this repository reads and writes through
    pub fn driver(&self) -> &Arc<dyn StoreDriver> {
        &self.driver
    }

    /// Lock guarding writes to one identity
    fn write_lock(&self, id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Load an entity by identity
    pub async fn get(&self, id: &str) -> Result<Option<E>> {
        let Some(cache) = &self.cache else {
            let Some(payload) = self.driver.read(E::COLLECTION, id).await? else {
                return Ok(None);
            };
            return Ok(Some(deserialize_entity(id, payload)?));
        };

        if let Some(payload) = cache.get(id).await {
            debug!(collection = E::COLLECTION, id, "repository cache hit");
            return Ok(Some(deserialize_entity(id, payload)?));
        }

        // Populate under the identity's write lock so a save landing
        // between our backend read and our insert cannot be overwritten
        // with the stale payload
        let lock = self.write_lock(id);
        let _guard = lock.lock().await;

        if let Some(payload) = cache.get(id).await {
            return Ok(Some(deserialize_entity(id, payload)?));
        }
        let Some(payload) = self.driver.read(E::COLLECTION, id).await? else {
            return Ok(None);
        };
        cache.insert(id.to_string(), payload.clone()).await;
        Ok(Some(deserialize_entity(id, payload)?))
    }

    /// Whether an entity with this identity exists
    pub async fn exists(&self, id: &str) -> Result<bool> {
        if let Some(cache) = &self.cache {
            if cache.contains_key(id) {
                return Ok(true);
            }
        }
        Ok(self.driver.read(E::COLLECTION, id).await?.is_some())
    }

    /// Persist an entity, assigning an identity when it has none
    ///
    /// Returns the identity the entity was stored under. Writes to the
    /// same identity are serialized; writes to different identities
    /// proceed concurrently.
    pub async fn save(&self, entity: &mut E) -> Result<String> {
        let id = match entity.id() {
            Some(id) => id.to_string(),
            None => {
                let id = self.driver.next_id();
                entity.set_id(id.clone());
                id
            }
        };

        let lock = self.write_lock(&id);
        let _guard = lock.lock().await;

        let payload = serde_json::to_value(&*entity)?;
        self.driver.write(E::COLLECTION, &id, &payload).await?;
        if let Some(cache) = &self.cache {
            cache.insert(id.clone(), payload).await;
        }
        Ok(id)
    }

    /// Delete an entity by identity
    ///
    /// Returns whether the entity existed. Deleting a missing identity is
    /// not an error.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let lock = self.write_lock(id);
        let _guard = lock.lock().await;

        let existed = self.driver.remove(E::COLLECTION, id).await?;
        if let Some(cache) = &self.cache {
            cache.invalidate(id).await;
        }
        Ok(existed)
    }

    /// Stream the entities matching a predicate.
    ///
    /// Lazy and single-pass: entities are decoded as the caller pulls
    /// them, and dropping the stream abandons the underlying scan. Drivers
    /// that support predicate pushdown filter natively; for the rest, the
    /// repository filters payloads in-process as they arrive.
    pub async fn query(&self, predicate: &Predicate) -> Result<EntityStream<E>> {
        self.stream(Some(predicate.clone())).await
    }

    /// Collect every entity matching a predicate
    pub async fn query_vec(&self, predicate: &Predicate) -> Result<Vec<E>> {
        self.query(predicate).await?.try_collect().await
    }

    /// Stream every entity in the collection
    pub async fn stream_all(&self) -> Result<EntityStream<E>> {
        self.stream(None).await
    }

    /// Collect every entity in the collection
    pub async fn all(&self) -> Result<Vec<E>> {
        self.stream_all().await?.try_collect().await
    }

    /// Identities of every entity in the collection
    pub async fn keys(&self) -> Result<Vec<String>> {
        let stream = self.driver.scan(E::COLLECTION, None).await?;
        let items: Vec<(String, Value)> = stream.try_collect().await?;
        Ok(items.into_iter().map(|(id, _)| id).collect())
    }

    /// Number of entities in the collection
    pub async fn count(&self) -> Result<usize> {
        Ok(self.keys().await?.len())
    }

    /// Ask the driver to flush any buffered writes
    pub async fn flush(&self) -> Result<()> {
        self.driver.flush().await
    }

    async fn stream(&self, predicate: Option<Predicate>) -> Result<EntityStream<E>> {
        let pushdown = self.driver.supports_predicate_pushdown();
        let driver_predicate = if pushdown { predicate.as_ref() } else { None };

        let scan = self.driver.scan(E::COLLECTION, driver_predicate).await?;
        let filter = if pushdown { None } else { predicate };

        let stream = scan.try_filter_map(move |(id, payload)| {
            let keep = filter.as_ref().is_none_or(|p| p.matches(&payload));
            futures::future::ready(if keep {
                deserialize_entity::<E>(&id, payload).map(Some)
            } else {
                Ok(None)
            })
        });
        Ok(Box::pin(stream))
    }
}

fn deserialize_entity<E: Entity>(id: &str, payload: Value) -> Result<E> {
    serde_json::from_value(payload).map_err(|e| {
        Error::store_with_source(
            format!(
                "Payload '{}' in collection '{}' does not deserialize",
                id,
                E::COLLECTION
            ),
            e,
        )
    })
}

impl<E: Entity> std::fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &E::COLLECTION)
            .field("driver", &self.driver.driver_name())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
