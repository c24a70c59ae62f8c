//! Error handling types

use crate::key::CapabilityKey;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Overseer runtime
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Malformed candidate metadata found during discovery.
    ///
    /// Isolated per candidate; never aborts the scan.
    #[error("Discovery error for candidate '{candidate}': {message}")]
    Discovery {
        /// Name of the candidate that failed validation
        candidate: String,
        /// Description of the malformed metadata
        message: String,
    },

    /// Dependency cycle detected during resolution.
    ///
    /// Fatal to container initialization; names every capability on a cycle.
    #[error("Cyclic dependency involving capabilities: {keys:?}")]
    CyclicDependency {
        /// Capability keys provided by the descriptors on the cycle
        keys: Vec<CapabilityKey>,
    },

    /// A required capability has no registered provider.
    #[error("Service '{service}' requires capability '{missing}' but no provider exists")]
    UnresolvedDependency {
        /// The service whose requirement cannot be satisfied
        service: String,
        /// The capability key with no provider
        missing: CapabilityKey,
    },

    /// Two descriptors claim to provide the same capability.
    #[error("Capability '{key}' is provided by both '{first}' and '{second}'")]
    DuplicateProvider {
        /// The capability key claimed twice
        key: CapabilityKey,
        /// The descriptor that claimed it first
        first: String,
        /// The descriptor that claimed it again
        second: String,
    },

    /// A lifecycle hook (construct/enable/disable) failed
    #[error("Lifecycle error in service '{service}' during {phase}: {message}")]
    Lifecycle {
        /// The service whose hook failed
        service: String,
        /// The lifecycle phase that was running
        phase: String,
        /// Description of the failure
        message: String,
    },

    /// Resource not found error
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Backend connection could not be established or was lost
    #[error("Connection failure: {message}")]
    ConnectionFailure {
        /// Description of the connection failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A write was rejected by the backend due to a conflicting update
    #[error("Write conflict: {message}")]
    WriteConflict {
        /// Description of the conflict
        message: String,
    },

    /// Storage backend operation error
    #[error("Store error: {message}")]
    Store {
        /// Description of the store error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A configuration resource exists but cannot be read
    #[error("Configuration resource unreadable: {resource}")]
    ResourceUnreadable {
        /// Path or key of the unreadable resource
        resource: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration content does not match the expected schema
    #[error("Configuration schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the mismatch
        message: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Basic error creation methods
impl Error {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a discovery error for a single candidate
    pub fn discovery<C: Into<String>, S: Into<String>>(candidate: C, message: S) -> Self {
        Self::Discovery {
            candidate: candidate.into(),
            message: message.into(),
        }
    }

    /// Create a lifecycle error
    pub fn lifecycle<N: Into<String>, P: Into<String>, S: Into<String>>(
        service: N,
        phase: P,
        message: S,
    ) -> Self {
        Self::Lifecycle {
            service: service.into(),
            phase: phase.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error with source
    pub fn internal_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a write conflict error
    pub fn write_conflict<S: Into<String>>(message: S) -> Self {
        Self::WriteConflict {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch<S: Into<String>>(message: S) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }
}

// I/O error creation methods
impl Error {
    /// Create an I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Store error creation methods
impl Error {
    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error with source
    pub fn store_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection failure error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::ConnectionFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failure error with source
    pub fn connection_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::ConnectionFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a resource unreadable error with source
    pub fn resource_unreadable<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        resource: S,
        source: E,
    ) -> Self {
        Self::ResourceUnreadable {
            resource: resource.into(),
            source: Some(Box::new(source)),
        }
    }
}
