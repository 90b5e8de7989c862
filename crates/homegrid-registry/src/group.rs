//! The component group aggregate.
//!
//! A `ComponentGroup` is only ever mutated by the registry while it holds the
//! group's lock. Values handed out by the registry are detached clones.

use std::collections::{BTreeMap, BTreeSet};

use homegrid_core::{ComponentUid, Document, GroupUid, InitializePolicy, MacroUid, Value};
use homegrid_state::GroupStateRecord;
use serde::Serialize;

use crate::error::{AssociationKind, RegistryError, RegistryResult};
use crate::settings::SettingsMap;

/// One component assigned to a group, with its association settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentAssociation {
    settings: SettingsMap,
}

impl ComponentAssociation {
    pub fn settings(&self) -> &SettingsMap {
        &self.settings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentGroup {
    uid: GroupUid,
    configuration: Document,
    settings: SettingsMap,
    status: SettingsMap,
    components: BTreeMap<ComponentUid, ComponentAssociation>,
    macros: BTreeSet<MacroUid>,
    initialized: bool,
}

impl ComponentGroup {
    pub fn new(uid: impl Into<GroupUid>, configuration: Document) -> Self {
        Self {
            uid: uid.into(),
            configuration,
            settings: SettingsMap::new(),
            status: SettingsMap::new(),
            components: BTreeMap::new(),
            macros: BTreeSet::new(),
            initialized: false,
        }
    }

    /// Rebuild a group from its stored configuration and persisted state.
    pub fn from_record(
        uid: impl Into<GroupUid>,
        configuration: Document,
        record: GroupStateRecord,
    ) -> Self {
        let mut group = Self::new(uid, configuration);
        group.settings = SettingsMap::from(record.settings);
        group.components = record
            .components
            .into_iter()
            .map(|(id, settings)| {
                (
                    id,
                    ComponentAssociation {
                        settings: SettingsMap::from(settings),
                    },
                )
            })
            .collect();
        group.macros = record.macros;
        group
    }

    /// The persistable part of the group: settings and associations.
    pub fn to_state_record(&self) -> GroupStateRecord {
        GroupStateRecord {
            settings: self.settings.clone().into_inner(),
            components: self
                .components
                .iter()
                .map(|(id, assoc)| (id.clone(), assoc.settings.clone().into_inner()))
                .collect(),
            macros: self.macros.clone(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn configuration(&self) -> &Document {
        &self.configuration
    }

    pub fn settings(&self) -> &SettingsMap {
        &self.settings
    }

    pub fn status(&self) -> &SettingsMap {
        &self.status
    }

    pub fn components(&self) -> &BTreeMap<ComponentUid, ComponentAssociation> {
        &self.components
    }

    pub fn macros(&self) -> &BTreeSet<MacroUid> {
        &self.macros
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn has_component(&self, component_uid: &str) -> bool {
        self.components.contains_key(component_uid)
    }

    pub fn has_macro(&self, macro_uid: &str) -> bool {
        self.macros.contains(macro_uid)
    }

    // ── Mutation (registry only) ───────────────────────────────────

    pub(crate) fn set_configuration(&mut self, configuration: Document) {
        self.configuration = configuration;
    }

    pub(crate) fn assign_component(&mut self, component_uid: &str) -> RegistryResult<()> {
        if self.components.contains_key(component_uid) {
            return Err(RegistryError::AlreadyAssigned {
                group: self.uid.clone(),
                kind: AssociationKind::Component,
                id: component_uid.to_string(),
            });
        }
        self.components
            .insert(component_uid.to_string(), ComponentAssociation::default());
        Ok(())
    }

    /// Remove a component together with all its association settings.
    pub(crate) fn unassign_component(
        &mut self,
        component_uid: &str,
    ) -> RegistryResult<ComponentAssociation> {
        self.components
            .remove(component_uid)
            .ok_or_else(|| self.component_missing(component_uid))
    }

    pub(crate) fn assign_macro(&mut self, macro_uid: &str) -> RegistryResult<()> {
        if !self.macros.insert(macro_uid.to_string()) {
            return Err(RegistryError::AlreadyAssigned {
                group: self.uid.clone(),
                kind: AssociationKind::Macro,
                id: macro_uid.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn unassign_macro(&mut self, macro_uid: &str) -> RegistryResult<()> {
        if !self.macros.remove(macro_uid) {
            return Err(RegistryError::AssociationNotFound {
                group: self.uid.clone(),
                kind: AssociationKind::Macro,
                id: macro_uid.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn component_setting(
        &self,
        component_uid: &str,
        setting_uid: &str,
    ) -> RegistryResult<&Value> {
        let assoc = self
            .components
            .get(component_uid)
            .ok_or_else(|| self.component_missing(component_uid))?;
        assoc
            .settings
            .get(setting_uid)
            .map_err(|e| RegistryError::SettingNotFound(e.0))
    }

    pub(crate) fn set_component_setting(
        &mut self,
        component_uid: &str,
        setting_uid: &str,
        value: Value,
    ) -> RegistryResult<Option<Value>> {
        let missing = self.component_missing(component_uid);
        let assoc = self.components.get_mut(component_uid).ok_or(missing)?;
        Ok(assoc.settings.set(setting_uid, value))
    }

    pub(crate) fn remove_component_setting(
        &mut self,
        component_uid: &str,
        setting_uid: &str,
    ) -> RegistryResult<Option<Value>> {
        let missing = self.component_missing(component_uid);
        let assoc = self.components.get_mut(component_uid).ok_or(missing)?;
        Ok(assoc.settings.remove(setting_uid))
    }

    pub(crate) fn setting(&self, setting_uid: &str) -> RegistryResult<&Value> {
        self.settings
            .get(setting_uid)
            .map_err(|e| RegistryError::SettingNotFound(e.0))
    }

    pub(crate) fn set_setting(&mut self, setting_uid: &str, value: Value) -> Option<Value> {
        self.settings.set(setting_uid, value)
    }

    pub(crate) fn remove_setting(&mut self, setting_uid: &str) -> Option<Value> {
        self.settings.remove(setting_uid)
    }

    pub(crate) fn set_status(&mut self, status_uid: &str, value: Value) -> Option<Value> {
        self.status.set(status_uid, value)
    }

    pub(crate) fn remove_status(&mut self, status_uid: &str) -> Option<Value> {
        self.status.remove(status_uid)
    }

    /// Enter the initialized state. Returns false when the group was already
    /// initialized and the policy tolerates it.
    pub(crate) fn initialize(&mut self, policy: InitializePolicy) -> RegistryResult<bool> {
        if self.initialized {
            return match policy {
                InitializePolicy::Strict => Err(RegistryError::AlreadyInitialized(self.uid.clone())),
                InitializePolicy::Idempotent => Ok(false),
            };
        }
        self.initialized = true;
        Ok(true)
    }

    fn component_missing(&self, component_uid: &str) -> RegistryError {
        RegistryError::AssociationNotFound {
            group: self.uid.clone(),
            kind: AssociationKind::Component,
            id: component_uid.to_string(),
        }
    }
}
