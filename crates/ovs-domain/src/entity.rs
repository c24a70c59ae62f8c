//! Repository-managed entities
//!
//! An entity is a single identity-addressed record owned by a repository
//! for its lifetime in the backing store. Identity is a string key, caller-
//! or backend-assigned; the identity field travels inside the serialized
//! payload.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Contract for a repository-managed record
///
/// ## Example
///
/// ```ignore
/// use ovs_domain::Entity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Profile {
///     id: Option<String>,
///     balance: u64,
/// }
///
/// impl Entity for Profile {
///     const COLLECTION: &'static str = "profiles";
///
///     fn id(&self) -> Option<&str> {
///         self.id.as_deref()
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = Some(id);
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection (namespace) this entity type lives in
    const COLLECTION: &'static str;

    /// The entity's identity, if already assigned.
    ///
    /// Callers must not assume identity is known before `save` returns:
    /// when absent, the repository requests one from the backend driver.
    fn id(&self) -> Option<&str>;

    /// Assign the entity's identity
    fn set_id(&mut self, id: String);
}
