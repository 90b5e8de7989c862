//! homegrid-registry — the component group registry.
//!
//! A [`Registry`] owns every component group known to the process. Each group
//! carries an opaque configuration document, a settings map, a status map,
//! assigned components (each with its own association settings) and assigned
//! macros.
//!
//! # Concurrency
//!
//! The collection sits behind one `RwLock`; every group has its own `Mutex`
//! guarding its whole nested state. Locks are always taken collection first,
//! group second. Operations on different groups run in parallel, operations
//! on the same group are serialized.
//!
//! # Persistence
//!
//! Configuration writes go to the [`ConfigurationStore`] before the in-memory
//! group changes. A failed save leaves the registry untouched. With
//! `persist_state` enabled the same applies to settings and associations.
//!
//! [`ConfigurationStore`]: homegrid_state::ConfigurationStore

pub mod error;
pub mod events;
pub mod group;
pub mod registry;
pub mod settings;

pub use error::{AssociationKind, ErrorKind, RegistryError, RegistryResult};
pub use events::RegistryEvent;
pub use group::{ComponentAssociation, ComponentGroup};
pub use registry::{Registry, RegistryOptions};
pub use settings::{KeyNotFound, SettingsMap};
