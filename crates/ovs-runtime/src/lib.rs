//! # Overseer - Runtime Layer
//!
//! Runtime services for the Overseer container: lifecycle orchestration,
//! typed repositories over pluggable store drivers, configuration
//! resources, and logging.
//!
//! ## Modules
//!
//! - `container` - service discovery, dependency resolution, and lifecycle
//! - `repository` - typed CRUD and query access over store drivers
//! - `configuration` - typed per-service configuration resources
//! - `config` - runtime settings loaded from TOML files and environment
//! - `logging` - structured logging setup with tracing
//! - `error_ext` - context extension methods for domain errors

pub mod config;
pub mod configuration;
pub mod container;
pub mod error_ext;
pub mod logging;
pub mod repository;

pub use config::{ConfigLoader, RuntimeConfig};
pub use configuration::{Configuration, JsonConfigBackend, TomlConfigBackend};
pub use container::Container;
pub use error_ext::ErrorContext;
pub use repository::{EntityStream, Repository};

// Re-export the domain surface hosts code against
pub use ovs_domain::descriptor::{LifecycleState, ServiceDescriptor};
pub use ovs_domain::entity::Entity;
pub use ovs_domain::error::{Error, Result};
pub use ovs_domain::key::CapabilityKey;
pub use ovs_domain::ports::service::{Service, ServiceContext};
pub use ovs_domain::ports::store::{FieldOp, Predicate, StoreDriver};
pub use ovs_domain::registry::{DriverConfig, list_store_drivers, resolve_store_driver};
