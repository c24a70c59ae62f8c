//! Document store driver
//!
//! Stores each document as its own JSON file under
//! `<base>/<collection>/<id>.json`. Scans stream directory entries lazily
//! and apply predicates natively, so the repository can push filters down
//! instead of materializing whole collections.

use async_trait::async_trait;
use futures::StreamExt;
use ovs_domain::error::{Error, Result};
use ovs_domain::ports::store::{Predicate, ScanStream, StoreDriver};
use ovs_domain::registry::{DriverConfig, STORE_DRIVERS, StoreDriverEntry};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::ReadDir;
use tracing::{debug, warn};

/// Document store driver
///
/// One JSON file per document. Writes are atomic per document
/// (temp-file+rename); scans are lazy directory walks.
#[derive(Debug)]
pub struct DocumentStoreDriver {
    base_dir: PathBuf,
}

impl DocumentStoreDriver {
    /// Create a driver rooted at the given directory
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.base_dir.join(collection)
    }

    fn document_path(&self, collection: &str, id: &str) -> Result<PathBuf> {
        validate_segment(collection)?;
        validate_segment(id)?;
        Ok(self.collection_dir(collection).join(format!("{id}.json")))
    }
}

/// Reject identities that would escape the collection directory
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
    {
        return Err(Error::store(format!(
            "Invalid collection or identity segment: {segment:?}"
        )));
    }
    Ok(())
}

/// Read and parse one document file; `None` when it does not exist
async fn read_document(path: &Path) -> Result<Option<Value>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let value = serde_json::from_str(&content).map_err(|e| {
                Error::store_with_source(format!("Corrupt document {}", path.display()), e)
            })?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io_with_source(
            format!("Failed to read document {}", path.display()),
            e,
        )),
    }
}

/// Pull the next `<id>.json` entry from a directory walk, skipping over
/// anything that is not a document file
async fn next_document_entry(dir: &mut ReadDir) -> Result<Option<(String, PathBuf)>> {
    loop {
        let entry = dir
            .next_entry()
            .await
            .map_err(|e| Error::io_with_source("Failed to walk collection directory", e))?;
        let Some(entry) = entry else {
            return Ok(None);
        };
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!(path = %path.display(), "skipping document with non-UTF-8 name");
            continue;
        };
        return Ok(Some((id.to_string(), path)));
    }
}

#[async_trait]
impl StoreDriver for DocumentStoreDriver {
    async fn connect(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| Error::io_with_source("Failed to create store directory", e))?;
        debug!(base_dir = %self.base_dir.display(), "document store driver connected");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let path = self.document_path(collection, id)?;
        read_document(&path).await
    }

    async fn write(&self, collection: &str, id: &str, payload: &Value) -> Result<()> {
        let path = self.document_path(collection, id)?;
        let dir = self.collection_dir(collection);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::io_with_source("Failed to create collection directory", e))?;

        let content = serde_json::to_string_pretty(payload)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content.as_bytes())
            .await
            .map_err(|e| Error::io_with_source(format!("Failed to write {}", tmp.display()), e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::io_with_source(format!("Failed to replace {}", path.display()), e))
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool> {
        let path = self.document_path(collection, id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io_with_source(
                format!("Failed to remove document {}", path.display()),
                e,
            )),
        }
    }

    async fn scan(&self, collection: &str, predicate: Option<&Predicate>) -> Result<ScanStream> {
        validate_segment(collection)?;
        let dir_path = self.collection_dir(collection);
        let dir = match tokio::fs::read_dir(&dir_path).await {
            Ok(dir) => Some(dir),
            // A collection that was never written to is empty, not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(Error::io_with_source(
                    format!("Failed to open collection directory {}", dir_path.display()),
                    e,
                ));
            }
        };
        let Some(dir) = dir else {
            return Ok(futures::stream::empty().boxed());
        };

        let predicate = predicate.cloned();
        let stream = futures::stream::try_unfold(dir, move |mut dir| {
            let predicate = predicate.clone();
            async move {
                loop {
                    let Some((id, path)) = next_document_entry(&mut dir).await? else {
                        return Ok(None);
                    };
                    // Deleted between listing and read; treat as absent
                    let Some(payload) = read_document(&path).await? else {
                        continue;
                    };
                    if predicate
                        .as_ref()
                        .is_some_and(|predicate| !predicate.matches(&payload))
                    {
                        continue;
                    }
                    return Ok(Some(((id, payload), dir)));
                }
            }
        });
        Ok(stream.boxed())
    }

    fn supports_predicate_pushdown(&self) -> bool {
        true
    }

    fn driver_name(&self) -> &str {
        "document"
    }
}

#[linkme::distributed_slice(STORE_DRIVERS)]
static DOCUMENT_DRIVER: StoreDriverEntry = StoreDriverEntry {
    name: "document",
    description: "Directory-of-documents store with predicate pushdown",
    factory: |config: &DriverConfig| {
        let base_dir = config
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("./data/documents"));
        Ok(Arc::new(DocumentStoreDriver::new(base_dir)))
    },
};
