//! Change notifications published by the registry.
//!
//! One event is sent per successful mutation, after the change is visible.
//! Failed operations publish nothing. Slow subscribers lag and lose the
//! oldest events; they never block the registry.

use homegrid_core::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    GroupRegistered {
        uid: String,
    },
    ConfigurationChanged {
        uid: String,
    },
    GroupDeleted {
        uid: String,
    },
    GroupInitialized {
        uid: String,
    },
    ComponentAssigned {
        uid: String,
        component_uid: String,
    },
    ComponentUnassigned {
        uid: String,
        component_uid: String,
    },
    MacroAssigned {
        uid: String,
        macro_uid: String,
    },
    MacroUnassigned {
        uid: String,
        macro_uid: String,
    },
    SettingChanged {
        uid: String,
        setting_uid: String,
        old_value: Option<Value>,
        new_value: Value,
    },
    SettingRemoved {
        uid: String,
        setting_uid: String,
        old_value: Value,
    },
    ComponentSettingChanged {
        uid: String,
        component_uid: String,
        setting_uid: String,
        old_value: Option<Value>,
        new_value: Value,
    },
    ComponentSettingRemoved {
        uid: String,
        component_uid: String,
        setting_uid: String,
        old_value: Value,
    },
    StatusChanged {
        uid: String,
        status_uid: String,
        old_value: Option<Value>,
        new_value: Value,
    },
    StatusRemoved {
        uid: String,
        status_uid: String,
        old_value: Value,
    },
}

impl RegistryEvent {
    /// Uid of the group the event belongs to.
    pub fn group_uid(&self) -> &str {
        match self {
            RegistryEvent::GroupRegistered { uid }
            | RegistryEvent::ConfigurationChanged { uid }
            | RegistryEvent::GroupDeleted { uid }
            | RegistryEvent::GroupInitialized { uid }
            | RegistryEvent::ComponentAssigned { uid, .. }
            | RegistryEvent::ComponentUnassigned { uid, .. }
            | RegistryEvent::MacroAssigned { uid, .. }
            | RegistryEvent::MacroUnassigned { uid, .. }
            | RegistryEvent::SettingChanged { uid, .. }
            | RegistryEvent::SettingRemoved { uid, .. }
            | RegistryEvent::ComponentSettingChanged { uid, .. }
            | RegistryEvent::ComponentSettingRemoved { uid, .. }
            | RegistryEvent::StatusChanged { uid, .. }
            | RegistryEvent::StatusRemoved { uid, .. } => uid,
        }
    }
}
