//! Flat-file store driver
//!
//! Stores each collection as a single JSON map file under a base directory.
//! The file is loaded into an in-memory image on first use and every
//! mutation is written through with a temp-file+rename, so readers never
//! observe a half-written file. Ideal for lightweight storage without the
//! overhead of an external store.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use ovs_domain::error::{Error, Result};
use ovs_domain::ports::store::{Predicate, ScanStream, StoreDriver};
use ovs_domain::registry::{DriverConfig, STORE_DRIVERS, StoreDriverEntry};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type CollectionImage = Arc<RwLock<HashMap<String, Value>>>;

/// Flat-file store driver
///
/// One `<collection>.json` file per collection; write-through with an
/// in-memory image per collection. Single-entity writes are atomic
/// (whole-file replace); nothing stronger is guaranteed.
pub struct FlatFileDriver {
    base_dir: PathBuf,
    images: DashMap<String, CollectionImage>,
}

impl FlatFileDriver {
    /// Create a driver rooted at the given directory
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
            images: DashMap::new(),
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_dir.join(format!("{collection}.json"))
    }

    /// Get or lazily load the in-memory image for a collection
    async fn image(&self, collection: &str) -> Result<CollectionImage> {
        if let Some(image) = self.images.get(collection) {
            return Ok(image.value().clone());
        }

        let path = self.collection_path(collection);
        let map = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::store_with_source(
                    format!("Corrupt collection file {}", path.display()),
                    e,
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(Error::io_with_source(
                    format!("Failed to read collection file {}", path.display()),
                    e,
                ));
            }
        };

        // A concurrent load of the same collection reads the same file;
        // whichever insert lands first wins.
        let image = self
            .images
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(map)))
            .value()
            .clone();
        Ok(image)
    }

    /// Persist an image to disk, atomically from the reader's perspective
    async fn persist(&self, collection: &str, entries: &HashMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.collection_path(collection).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_with_source("Failed to create store directory", e))?;
        }

        let path = self.collection_path(collection);
        let content = serde_json::to_string_pretty(entries)?;
        write_atomic(&path, content.as_bytes()).await
    }
}

/// Write bytes to a temp file next to `path`, then rename over it
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| Error::io_with_source(format!("Failed to write {}", tmp.display()), e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::io_with_source(format!("Failed to replace {}", path.display()), e))
}

#[async_trait]
impl StoreDriver for FlatFileDriver {
    async fn connect(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| Error::io_with_source("Failed to create store directory", e))?;
        debug!(base_dir = %self.base_dir.display(), "flat-file driver connected");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // Write-through means nothing is buffered; just drop the images
        self.images.clear();
        Ok(())
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let image = self.image(collection).await?;
        let entries = image.read().await;
        Ok(entries.get(id).cloned())
    }

    async fn write(&self, collection: &str, id: &str, payload: &Value) -> Result<()> {
        let image = self.image(collection).await?;
        let mut entries = image.write().await;
        let previous = entries.insert(id.to_string(), payload.clone());
        if let Err(e) = self.persist(collection, &entries).await {
            // The write never committed; readers must keep seeing the
            // old value
            match previous {
                Some(old) => entries.insert(id.to_string(), old),
                None => entries.remove(id),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool> {
        let image = self.image(collection).await?;
        let mut entries = image.write().await;
        let Some(removed) = entries.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(collection, &entries).await {
            entries.insert(id.to_string(), removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn scan(&self, collection: &str, _predicate: Option<&Predicate>) -> Result<ScanStream> {
        let image = self.image(collection).await?;
        let entries = image.read().await;

        // Point-in-time snapshot in key order
        let mut items: Vec<(String, Value)> = entries
            .iter()
            .map(|(id, payload)| (id.clone(), payload.clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(futures::stream::iter(items.into_iter().map(Ok)).boxed())
    }

    fn driver_name(&self) -> &str {
        "file"
    }
}

impl std::fmt::Debug for FlatFileDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatFileDriver")
            .field("base_dir", &self.base_dir)
            .field("loaded_collections", &self.images.len())
            .finish()
    }
}

#[linkme::distributed_slice(STORE_DRIVERS)]
static FILE_DRIVER: StoreDriverEntry = StoreDriverEntry {
    name: "file",
    description: "Flat JSON map file per collection",
    factory: |config: &DriverConfig| {
        let base_dir = config
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("./data/flatfile"));
        Ok(Arc::new(FlatFileDriver::new(base_dir)))
    },
};
