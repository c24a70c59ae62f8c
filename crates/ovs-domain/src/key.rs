//! Capability keys
//!
//! A capability key is the stable identifier by which a service's provided
//! functionality is looked up by other services. Keys are plain string
//! tokens; the container checks provider uniqueness at resolution time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a provided capability
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityKey(String);

impl CapabilityKey {
    /// Create a new capability key
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty (malformed)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CapabilityKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CapabilityKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CapabilityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display_and_conversion() {
        let key = CapabilityKey::from("economy");
        assert_eq!(key.as_str(), "economy");
        assert_eq!(key.to_string(), "economy");
        assert_eq!(key, CapabilityKey::new(String::from("economy")));
    }

    #[test]
    fn test_empty_key_detected() {
        assert!(CapabilityKey::new("").is_empty());
        assert!(!CapabilityKey::new("x").is_empty());
    }
}
