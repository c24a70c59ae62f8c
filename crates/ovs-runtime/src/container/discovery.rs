//! Service discovery
//!
//! Turns the static candidate registry into validated descriptors. A
//! malformed candidate is recorded and skipped; it never aborts the scan,
//! so one broken registration cannot take down the whole container.

use ovs_domain::descriptor::ServiceDescriptor;
use ovs_domain::error::Error;
use ovs_domain::registry::SERVICE_CANDIDATES;
use tracing::{debug, warn};

/// Outcome of a discovery scan
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Descriptors that passed validation, in registration order
    pub descriptors: Vec<ServiceDescriptor>,
    /// Candidates rejected during validation, with the reason
    pub rejected: Vec<RejectedCandidate>,
}

/// A candidate that failed descriptor validation
#[derive(Debug)]
pub struct RejectedCandidate {
    /// Name the candidate registered under
    pub name: String,
    /// The validation error
    pub error: Error,
}

impl DiscoveryReport {
    /// Whether any candidate was rejected
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Scan the static registry and validate every candidate
pub fn discover() -> DiscoveryReport {
    discover_from(SERVICE_CANDIDATES.iter().map(|c| c.to_descriptor()))
}

/// Validate an explicit set of descriptors.
///
/// Used by hosts that assemble services programmatically instead of (or in
/// addition to) the static registry.
pub fn discover_from<I>(candidates: I) -> DiscoveryReport
where
    I: IntoIterator<Item = ServiceDescriptor>,
{
    let mut report = DiscoveryReport::default();

    for descriptor in candidates {
        match validated(descriptor) {
            Ok(descriptor) => {
                debug!(
                    service = %descriptor.name,
                    provides = ?descriptor.provides,
                    requires = ?descriptor.requires,
                    "service discovered"
                );
                report.descriptors.push(descriptor);
            }
            Err((name, error)) => {
                warn!(candidate = %name, %error, "rejecting malformed service candidate");
                report.rejected.push(RejectedCandidate { name, error });
            }
        }
    }

    report
}

fn validated(
    descriptor: ServiceDescriptor,
) -> std::result::Result<ServiceDescriptor, (String, Error)> {
    match descriptor.validate() {
        Ok(()) => Ok(descriptor),
        Err(error) => {
            let name = if descriptor.name.is_empty() {
                "<unnamed>".to_string()
            } else {
                descriptor.name.clone()
            };
            Err((name, error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovs_domain::ports::service::{Service, ServiceContext};
    use std::sync::Arc;

    fn failing_construct(
        _ctx: &ServiceContext,
    ) -> ovs_domain::Result<Arc<dyn Service>> {
        Err(Error::internal("not constructible"))
    }

    #[test]
    fn test_valid_candidates_pass() {
        let report = discover_from(vec![
            ServiceDescriptor::new("storage", failing_construct).provides("storage"),
            ServiceDescriptor::new("bank", failing_construct)
                .provides("economy")
                .requires("storage"),
        ]);
        assert_eq!(report.descriptors.len(), 2);
        assert!(!report.has_rejections());
    }

    #[test]
    fn test_malformed_candidate_is_isolated() {
        let report = discover_from(vec![
            ServiceDescriptor::new("broken", failing_construct),
            ServiceDescriptor::new("storage", failing_construct).provides("storage"),
        ]);
        assert_eq!(report.descriptors.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].name, "broken");
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let report = discover_from(vec![
            ServiceDescriptor::new("c", failing_construct).provides("c"),
            ServiceDescriptor::new("a", failing_construct).provides("a"),
            ServiceDescriptor::new("b", failing_construct).provides("b"),
        ]);
        let names: Vec<&str> = report.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
