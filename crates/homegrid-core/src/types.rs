//! Shared types used across homegrid crates.

use serde::{Deserialize, Serialize};

/// Opaque configuration payload of a component group.
///
/// The registry never interprets it; the group owner assigns meaning.
pub type Document = serde_json::Value;

/// Value stored in a settings or status map.
pub type Value = serde_json::Value;

/// Identifier of a component group, unique within a registry.
pub type GroupUid = String;

/// Identifier of a component assigned to a group.
pub type ComponentUid = String;

/// Identifier of a macro assigned to a group.
pub type MacroUid = String;

/// What `write_configuration` does when the group does not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Create the group from the supplied configuration.
    #[default]
    Upsert,
    /// Fail with not-found; groups are only created by explicit registration.
    RequireExisting,
}

/// What a second `initialize_group` call on the same group does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitializePolicy {
    /// Reject the call with an already-initialized error.
    #[default]
    Strict,
    /// Accept the call and leave the group as it is.
    Idempotent,
}

impl WritePolicy {
    pub fn creates_missing(&self) -> bool {
        matches!(self, WritePolicy::Upsert)
    }
}
