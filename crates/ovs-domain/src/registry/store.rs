//! Store Driver Registry
//!
//! Auto-registration system for storage backend drivers.
//! Drivers register themselves via `linkme::distributed_slice` and are
//! resolved by name at runtime from a connection descriptor.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::ports::store::StoreDriver;

/// Connection descriptor for driver creation
///
/// Contents are opaque to the core: each driver reads the fields it needs
/// and ignores the rest.
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    /// Driver name (e.g. "document", "kv", "file", "memory")
    pub driver: String,
    /// Connection URI (for networked backends)
    pub uri: Option<String>,
    /// Base path (for file-backed backends)
    pub path: Option<PathBuf>,
    /// Namespace prefix for keys
    pub namespace: Option<String>,
    /// Additional driver-specific configuration
    pub extra: HashMap<String, String>,
}

impl DriverConfig {
    /// Create a new config with the given driver name
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Default::default()
        }
    }

    /// Set the URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the base path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add extra configuration
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Registry entry for store drivers
///
/// Each driver implementation registers itself with this entry using a
/// `linkme::distributed_slice`. The entry contains metadata and a factory
/// function to create driver instances.
pub struct StoreDriverEntry {
    /// Unique driver name (e.g. "document", "kv", "file")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Factory function to create driver instances
    pub factory: fn(&DriverConfig) -> Result<Arc<dyn StoreDriver>, String>,
}

// Drivers submit entries at compile time
#[linkme::distributed_slice]
pub static STORE_DRIVERS: [StoreDriverEntry] = [..];

/// Resolve a store driver by name from the registry
///
/// Searches the registry for a driver matching the configured name and
/// creates an instance using the driver's factory function.
pub fn resolve_store_driver(config: &DriverConfig) -> Result<Arc<dyn StoreDriver>, String> {
    for entry in STORE_DRIVERS {
        if entry.name == config.driver {
            return (entry.factory)(config);
        }
    }

    let available: Vec<&str> = STORE_DRIVERS.iter().map(|e| e.name).collect();
    Err(format!(
        "Unknown store driver '{}'. Available drivers: {:?}",
        config.driver, available
    ))
}

/// List all registered store drivers as (name, description) tuples
pub fn list_store_drivers() -> Vec<(&'static str, &'static str)> {
    STORE_DRIVERS.iter().map(|e| (e.name, e.description)).collect()
}
