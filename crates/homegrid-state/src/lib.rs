//! homegrid-state — configuration store for component groups.
//!
//! Backed by [redb](https://docs.rs/redb). The registry only talks to the
//! [`ConfigurationStore`] trait; [`StateStore`] is the shipped implementation
//! with on-disk and in-memory backends.
//!
//! # Layout
//!
//! Two tables, both keyed by group uid with JSON-serialized values:
//! `configurations` holds the opaque configuration document and
//! `group_state` holds the persisted settings and associations.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::{ConfigurationStore, StateStore};
pub use types::*;
