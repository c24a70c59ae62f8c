//! Service Port
//!
//! Contract implemented by every managed service. Lifecycle hooks take
//! `&self`; services keep mutable state behind interior mutability so the
//! container can hold them as shared trait objects.
//!
//! ## Example
//!
//! ```ignore
//! use ovs_domain::ports::service::{Service, ServiceContext};
//!
//! #[derive(Debug)]
//! struct BankService;
//!
//! #[async_trait::async_trait]
//! impl Service for BankService {
//!     fn name(&self) -> &str {
//!         "bank"
//!     }
//!
//!     async fn enable(&self, ctx: &ServiceContext) -> ovs_domain::Result<()> {
//!         let storage = ctx.dependency(&"storage".into())?;
//!         tracing::info!(dependency = storage.name(), "bank enabled");
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::{Error, Result};
use crate::key::CapabilityKey;
use downcast_rs::{DowncastSync, impl_downcast};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Contract for a managed service instance
#[async_trait::async_trait]
pub trait Service: DowncastSync + std::fmt::Debug {
    /// Stable service name, matching its descriptor
    fn name(&self) -> &str;

    /// Enable hook, run after construction in dependency order.
    ///
    /// The context carries the already-enabled instances providing this
    /// service's required capabilities.
    async fn enable(&self, ctx: &ServiceContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Disable hook, run in reverse enable order during teardown,
    /// rollback, and reload.
    async fn disable(&self) -> Result<()> {
        Ok(())
    }
}

impl_downcast!(sync Service);

/// Wired view handed to a service's construct and enable hooks.
///
/// Holds the dependency instances declared by the service's descriptor plus
/// the host-supplied data and config directories. The context never exposes
/// services outside the declared dependency set; there is no ambient
/// registry to reach into.
#[derive(Debug, Clone, Default)]
pub struct ServiceContext {
    wired: HashMap<CapabilityKey, Arc<dyn Service>>,
    data_dir: PathBuf,
    config_dir: PathBuf,
}

impl ServiceContext {
    /// Create a context with no wired dependencies
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(data_dir: P, config_dir: Q) -> Self {
        Self {
            wired: HashMap::new(),
            data_dir: data_dir.into(),
            config_dir: config_dir.into(),
        }
    }

    /// Wire a dependency instance under its capability key
    pub fn with_dependency(mut self, key: CapabilityKey, instance: Arc<dyn Service>) -> Self {
        self.wired.insert(key, instance);
        self
    }

    /// Look up a wired dependency by capability key
    pub fn dependency(&self, key: &CapabilityKey) -> Result<Arc<dyn Service>> {
        self.wired
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("capability '{key}'")))
    }

    /// Look up a wired dependency and downcast it to a concrete type
    pub fn dependency_as<T: Service>(&self, key: &CapabilityKey) -> Result<Arc<T>> {
        let instance = self.dependency(key)?;
        instance.into_any_arc().downcast::<T>().map_err(|_| {
            Error::internal(format!(
                "capability '{key}' is not provided by the expected type"
            ))
        })
    }

    /// Directory for backend data owned by this container
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory for configuration resources
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Number of wired dependencies
    pub fn dependency_count(&self) -> usize {
        self.wired.len()
    }
}
