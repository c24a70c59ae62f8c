//! Configuration Backend Port
//!
//! Byte-oriented contract for configuration resources. Backends parse and
//! render one concrete format (JSON, TOML); the typed default-fill contract
//! lives above this port in the runtime crate.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Contract for a configuration format backend
#[async_trait]
pub trait ConfigBackend: Send + Sync + std::fmt::Debug {
    /// Read and parse the resource.
    ///
    /// Returns `None` when the resource does not exist;
    /// `ResourceUnreadable` or `SchemaMismatch` when it exists but cannot
    /// be parsed.
    async fn read(&self, path: &Path) -> Result<Option<Value>>;

    /// Serialize and write the resource.
    ///
    /// Atomic from the caller's point of view: no reader ever observes a
    /// half-written resource.
    async fn write(&self, path: &Path, value: &Value) -> Result<()>;

    /// File extension handled by this backend (without the dot)
    fn extension(&self) -> &'static str;
}
