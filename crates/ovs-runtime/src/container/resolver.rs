//! Dependency resolution
//!
//! Orders validated descriptors so that every provider precedes its
//! dependents. Resolution is fatal on a missing provider, a capability
//! claimed twice, or a dependency cycle; the cycle error names exactly the
//! descriptors sitting on a cycle, not the innocent services downstream
//! of one.

use ovs_domain::descriptor::ServiceDescriptor;
use ovs_domain::error::{Error, Result};
use ovs_domain::key::CapabilityKey;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Compute a start order over the descriptors.
///
/// Returns indices into `descriptors`. Ties are broken by declaration
/// order, so the result is deterministic for a given registration sequence.
pub fn resolve(descriptors: &[ServiceDescriptor]) -> Result<Vec<usize>> {
    let provider_of = index_providers(descriptors)?;

    // Edges run provider -> dependent
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); descriptors.len()];
    let mut indegree: Vec<usize> = vec![0; descriptors.len()];

    for (idx, descriptor) in descriptors.iter().enumerate() {
        // De-duplicate repeated requires of the same capability
        let mut seen: BTreeSet<usize> = BTreeSet::new();
        for key in &descriptor.requires {
            let Some(&provider) = provider_of.get(key) else {
                return Err(Error::UnresolvedDependency {
                    service: descriptor.name.clone(),
                    missing: key.clone(),
                });
            };
            if seen.insert(provider) {
                dependents[provider].push(idx);
                indegree[idx] += 1;
            }
        }
    }

    // Kahn's algorithm; the ready set is ordered by declaration index
    let mut ready: BTreeSet<usize> = (0..descriptors.len())
        .filter(|&idx| indegree[idx] == 0)
        .collect();

    let mut order = Vec::with_capacity(descriptors.len());
    while let Some(&idx) = ready.iter().next() {
        ready.remove(&idx);
        order.push(idx);
        for &dependent in &dependents[idx] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < descriptors.len() {
        return Err(cycle_error(descriptors, &dependents, &order));
    }

    debug!(
        order = ?order.iter().map(|&i| descriptors[i].name.as_str()).collect::<Vec<_>>(),
        "dependency resolution complete"
    );
    Ok(order)
}

/// Map each capability key to the descriptor providing it
fn index_providers(descriptors: &[ServiceDescriptor]) -> Result<HashMap<CapabilityKey, usize>> {
    let mut names: HashSet<&str> = HashSet::new();
    for descriptor in descriptors {
        if !names.insert(descriptor.name.as_str()) {
            return Err(Error::discovery(
                &descriptor.name,
                "duplicate service name",
            ));
        }
    }

    let mut provider_of: HashMap<CapabilityKey, usize> = HashMap::new();
    for (idx, descriptor) in descriptors.iter().enumerate() {
        for key in &descriptor.provides {
            if let Some(&first) = provider_of.get(key) {
                return Err(Error::DuplicateProvider {
                    key: key.clone(),
                    first: descriptors[first].name.clone(),
                    second: descriptor.name.clone(),
                });
            }
            provider_of.insert(key.clone(), idx);
        }
    }
    Ok(provider_of)
}

/// Build the cycle error, trimming descriptors that merely depend on a
/// cycle until only actual cycle members remain
fn cycle_error(
    descriptors: &[ServiceDescriptor],
    dependents: &[Vec<usize>],
    emitted: &[usize],
) -> Error {
    let mut remaining: BTreeSet<usize> = (0..descriptors.len()).collect();
    for &idx in emitted {
        remaining.remove(&idx);
    }

    // Peel off sinks of the remaining subgraph; cycle members always keep
    // at least one remaining dependent
    loop {
        let sinks: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&idx| !dependents[idx].iter().any(|d| remaining.contains(d)))
            .collect();
        if sinks.is_empty() {
            break;
        }
        for idx in sinks {
            remaining.remove(&idx);
        }
    }

    let mut keys: Vec<CapabilityKey> = remaining
        .iter()
        .flat_map(|&idx| descriptors[idx].provides.iter().cloned())
        .collect();
    keys.sort();
    keys.dedup();

    Error::CyclicDependency { keys }
}
