//! # Overseer - Storage Backend Drivers
//!
//! This crate contains the storage backend drivers. Each driver implements
//! the [`StoreDriver`] port defined in `ovs-domain` against one concrete
//! store and registers itself in the `STORE_DRIVERS` table.
//!
//! ## Driver Categories
//!
//! | Driver | Backend | Predicate pushdown |
//! |--------|---------|--------------------|
//! | `document` | one JSON file per document | yes |
//! | `kv` | Redis | no |
//! | `file` | one flat JSON map file per collection | no |
//! | `memory` | process-local maps | no |
//!
//! ## Feature Flags
//!
//! Each driver can be enabled/disabled via feature flags for minimal builds:
//!
//! ```toml
//! [dependencies]
//! ovs-stores = { version = "0.1", default-features = false, features = ["document", "file"] }
//! ```

// Re-export ovs-domain types commonly used with drivers
pub use ovs_domain::error::{Error, Result};
pub use ovs_domain::ports::store::StoreDriver;
pub use ovs_domain::registry::{DriverConfig, resolve_store_driver};

/// In-memory driver
///
/// Data is not persisted and will be lost on restart.
#[cfg(feature = "memory")]
pub mod memory;

/// Document store driver
///
/// One JSON file per document; supports predicate pushdown during scans.
#[cfg(feature = "document")]
pub mod document;

/// Flat-file driver
///
/// One JSON map file per collection, written through atomically.
#[cfg(feature = "file")]
pub mod file;

/// Redis key-value driver
#[cfg(feature = "kv")]
pub mod kv;

#[cfg(feature = "memory")]
pub use memory::MemoryDriver;

#[cfg(feature = "document")]
pub use document::DocumentStoreDriver;

#[cfg(feature = "file")]
pub use file::FlatFileDriver;

#[cfg(feature = "kv")]
pub use kv::RedisKvDriver;
