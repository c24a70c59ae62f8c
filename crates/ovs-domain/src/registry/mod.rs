//! Registration tables
//!
//! Link-time registries for storage backend drivers and discoverable
//! service candidates.

pub mod service;
pub mod store;

pub use service::{SERVICE_CANDIDATES, ServiceCandidate};
pub use store::{
    DriverConfig, STORE_DRIVERS, StoreDriverEntry, list_store_drivers, resolve_store_driver,
};
