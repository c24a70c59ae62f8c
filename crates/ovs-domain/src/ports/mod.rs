//! Port definitions
//!
//! Contracts between the container core and its collaborators: managed
//! services, storage backend drivers, and configuration backends.

pub mod config;
pub mod service;
pub mod store;

pub use config::ConfigBackend;
pub use service::{Service, ServiceContext};
pub use store::{FieldOp, Predicate, ScanItem, ScanStream, StoreDriver};
