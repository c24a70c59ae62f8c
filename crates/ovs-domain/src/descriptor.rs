//! Service descriptor model
//!
//! A descriptor is the metadata record describing a discoverable service:
//! the capabilities it provides, the capabilities it requires, and the hook
//! used to construct its instance. Descriptors are built once per container
//! initialization and discarded on shutdown.

use crate::error::{Error, Result};
use crate::key::CapabilityKey;
use crate::ports::service::{Service, ServiceContext};
use serde::Serialize;
use std::sync::Arc;

/// Constructor hook invoked by the scheduler to create a service instance.
///
/// Receives a context pre-wired with the instances providing the
/// descriptor's required capabilities.
pub type ConstructFn = fn(&ServiceContext) -> Result<Arc<dyn Service>>;

/// Lifecycle state of a managed service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    /// Descriptor produced by discovery, dependencies not yet checked
    Discovered,
    /// Dependency check passed, position in enable order assigned
    Resolved,
    /// Instance created, enable hook not yet run
    Constructed,
    /// Enable hook completed successfully
    Enabled,
    /// Disabled explicitly or during teardown
    Disabled,
    /// Unrecoverable error during a transition
    Failed,
}

impl LifecycleState {
    /// Whether a lookup against this state may return an instance
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Metadata describing a discoverable service
#[derive(Clone)]
pub struct ServiceDescriptor {
    /// Stable service name, unique per container
    pub name: String,
    /// Capability keys this service provides (non-empty)
    pub provides: Vec<CapabilityKey>,
    /// Capability keys this service requires, in declaration order
    pub requires: Vec<CapabilityKey>,
    /// Constructor hook
    pub construct: ConstructFn,
}

impl ServiceDescriptor {
    /// Create a descriptor with no declared capabilities.
    ///
    /// At least one provided capability must be added before the descriptor
    /// passes discovery validation.
    pub fn new<S: Into<String>>(name: S, construct: ConstructFn) -> Self {
        Self {
            name: name.into(),
            provides: Vec::new(),
            requires: Vec::new(),
            construct,
        }
    }

    /// Declare a provided capability
    pub fn provides<K: Into<CapabilityKey>>(mut self, key: K) -> Self {
        self.provides.push(key.into());
        self
    }

    /// Declare a required capability
    pub fn requires<K: Into<CapabilityKey>>(mut self, key: K) -> Self {
        self.requires.push(key.into());
        self
    }

    /// Validate the descriptor's metadata.
    ///
    /// Checked per candidate during discovery: an invalid descriptor yields
    /// a `Failed` slot instead of aborting the scan.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::discovery("<unnamed>", "descriptor has no name"));
        }
        if self.provides.is_empty() {
            return Err(Error::discovery(
                &self.name,
                "descriptor provides no capabilities",
            ));
        }
        if self.provides.iter().any(CapabilityKey::is_empty) {
            return Err(Error::discovery(&self.name, "empty capability key"));
        }
        if let Some(key) = self.requires.iter().find(|k| self.provides.contains(k)) {
            return Err(Error::discovery(
                &self.name,
                format!("descriptor depends on its own capability '{key}'"),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("provides", &self.provides)
            .field("requires", &self.requires)
            .finish()
    }
}
