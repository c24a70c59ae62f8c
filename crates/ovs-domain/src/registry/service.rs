//! Service Candidate Registry
//!
//! Static registration table for discoverable services. Candidates register
//! themselves via `linkme::distributed_slice`; the discovery engine turns
//! each candidate into a descriptor. This replaces runtime type
//! introspection with a link-time table while preserving "discover all
//! providers" semantics.
//!
//! ## Example
//!
//! ```ignore
//! use ovs_domain::registry::{ServiceCandidate, SERVICE_CANDIDATES};
//!
//! #[linkme::distributed_slice(SERVICE_CANDIDATES)]
//! static BANK_SERVICE: ServiceCandidate = ServiceCandidate {
//!     name: "bank",
//!     provides: &["economy"],
//!     requires: &["storage"],
//!     construct: |_ctx| Ok(std::sync::Arc::new(BankService::default())),
//! };
//! ```

use crate::descriptor::{ConstructFn, ServiceDescriptor};
use crate::key::CapabilityKey;

/// Registry entry for a discoverable service
pub struct ServiceCandidate {
    /// Stable service name
    pub name: &'static str,
    /// Capability keys this service provides
    pub provides: &'static [&'static str],
    /// Capability keys this service requires
    pub requires: &'static [&'static str],
    /// Constructor hook
    pub construct: ConstructFn,
}

// Candidates submit entries at compile time
#[linkme::distributed_slice]
pub static SERVICE_CANDIDATES: [ServiceCandidate] = [..];

impl ServiceCandidate {
    /// Build the descriptor for this candidate.
    ///
    /// Validation happens later, per candidate, in the discovery engine.
    pub fn to_descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor {
            name: self.name.to_string(),
            provides: self.provides.iter().map(|k| CapabilityKey::from(*k)).collect(),
            requires: self.requires.iter().map(|k| CapabilityKey::from(*k)).collect(),
            construct: self.construct,
        }
    }
}
