//! Domain layer for Overseer
//!
//! Core types shared by the runtime and the backend drivers: the error
//! taxonomy, capability keys, the service descriptor model, the entity
//! contract, and the ports implemented by services, storage drivers, and
//! configuration backends.

pub mod descriptor;
pub mod entity;
pub mod error;
pub mod key;
pub mod ports;
pub mod registry;

pub use descriptor::{ConstructFn, LifecycleState, ServiceDescriptor};
pub use entity::Entity;
pub use error::{Error, Result};
pub use key::CapabilityKey;
pub use ports::{ConfigBackend, FieldOp, Predicate, Service, ServiceContext, StoreDriver};
