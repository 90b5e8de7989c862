//! Registry — the single source of truth for component groups.
//!
//! The `Registry`:
//! - Registers groups from a supplied configuration or from the store
//! - Serializes every operation on one group behind that group's lock
//! - Writes configuration (and optionally settings and associations) through
//!   to the store before changing memory
//! - Publishes a [`RegistryEvent`] for every successful mutation

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use homegrid_core::config::RegistryConfig;
use homegrid_core::{Document, GroupUid, InitializePolicy, Value, WritePolicy};
use homegrid_state::ConfigurationStore;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::error::{RegistryError, RegistryResult, validate_identifier};
use crate::events::RegistryEvent;
use crate::group::ComponentGroup;

/// Behavior switches of a registry. Mirrors the `[registry]` section of
/// `homegrid.toml`.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub write_policy: WritePolicy,
    pub initialize_policy: InitializePolicy,
    pub persist_state: bool,
    pub initialize_on_load: bool,
    pub event_capacity: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self::from(&RegistryConfig::default())
    }
}

impl From<&RegistryConfig> for RegistryOptions {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            write_policy: config.write_policy,
            initialize_policy: config.initialize_policy,
            persist_state: config.persist_state,
            initialize_on_load: config.initialize_on_load,
            event_capacity: config.event_capacity,
        }
    }
}

/// A group plus its removal mark.
///
/// `removed` is set by `delete_group` while it holds both this slot's lock
/// and the collection write lock. Anyone who grabbed the slot earlier sees
/// the mark once they get the lock and reports the group as not found.
///
/// Lock order: a slot lock may be held while taking the collection lock
/// (`delete_group`), never the reverse. Everything else releases the
/// collection lock before locking a slot.
struct GroupSlot {
    group: ComponentGroup,
    removed: bool,
}

type SharedSlot = Arc<Mutex<GroupSlot>>;

fn new_slot(group: ComponentGroup) -> SharedSlot {
    Arc::new(Mutex::new(GroupSlot {
        group,
        removed: false,
    }))
}

pub struct Registry {
    store: Arc<dyn ConfigurationStore>,
    options: RegistryOptions,
    /// Live groups: uid → slot.
    groups: RwLock<BTreeMap<GroupUid, SharedSlot>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Registry {
    /// Create an empty registry over the given store.
    pub fn new(store: Arc<dyn ConfigurationStore>, options: RegistryOptions) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            store,
            options,
            groups: RwLock::new(BTreeMap::new()),
            events,
        }
    }

    /// Create a registry and register every group found in the store.
    pub async fn open(
        store: Arc<dyn ConfigurationStore>,
        options: RegistryOptions,
    ) -> RegistryResult<Self> {
        let registry = Self::new(store, options);
        registry.load_from_store().await?;
        Ok(registry)
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }

    pub async fn contains(&self, uid: &str) -> bool {
        self.groups.read().await.contains_key(uid)
    }

    // ── Loading ────────────────────────────────────────────────────

    /// Register every stored group that is not in memory yet.
    ///
    /// A group that fails to load is logged and skipped. Returns the number
    /// of groups registered.
    pub async fn load_from_store(&self) -> RegistryResult<usize> {
        let uids = self.store.list_uids()?;
        let mut loaded = 0;

        for uid in uids {
            // The store read and the insert happen under the collection write
            // lock so a concurrent delete cannot land between them.
            let mut groups = self.groups.write().await;
            let Entry::Vacant(entry) = groups.entry(uid.clone()) else {
                continue;
            };
            let group = match self.load_group(&uid) {
                Ok(Some(group)) => group,
                Ok(None) => {
                    warn!(%uid, "component group vanished from store during load");
                    continue;
                }
                Err(e) => {
                    warn!(%uid, error = %e, "skipping component group that failed to load");
                    continue;
                }
            };
            entry.insert(new_slot(group));
            drop(groups);

            loaded += 1;
            debug!(%uid, "component group loaded");
            self.publish(RegistryEvent::GroupRegistered { uid });
        }

        info!(loaded, "component groups loaded from store");
        Ok(loaded)
    }

    fn load_group(&self, uid: &str) -> RegistryResult<Option<ComponentGroup>> {
        let Some(configuration) = self.store.load(uid)? else {
            return Ok(None);
        };
        let record = if self.options.persist_state {
            self.store.load_state(uid)?.unwrap_or_default()
        } else {
            Default::default()
        };
        let mut group = ComponentGroup::from_record(uid, configuration, record);
        if self.options.initialize_on_load {
            group.initialize(InitializePolicy::Idempotent)?;
        }
        Ok(Some(group))
    }

    // ── Groups ─────────────────────────────────────────────────────

    /// Snapshot of all groups, ordered by uid.
    pub async fn list_groups(&self) -> Vec<ComponentGroup> {
        let slots: Vec<SharedSlot> = self.groups.read().await.values().cloned().collect();
        let mut groups = Vec::with_capacity(slots.len());
        for slot in slots {
            let slot = slot.lock().await;
            if !slot.removed {
                groups.push(slot.group.clone());
            }
        }
        groups
    }

    pub async fn get_group(&self, uid: &str) -> RegistryResult<ComponentGroup> {
        self.read(uid, |group| Ok(group.clone())).await
    }

    /// Like [`get_group`](Self::get_group), but reports a miss as `None`.
    pub async fn try_get_group(&self, uid: &str) -> Option<ComponentGroup> {
        self.get_group(uid).await.ok()
    }

    /// Create a group. Fails if the uid is already registered.
    pub async fn register_group(&self, uid: &str, configuration: Document) -> RegistryResult<()> {
        validate_identifier("group", uid)?;
        let mut groups = self.groups.write().await;
        if groups.contains_key(uid) {
            return Err(RegistryError::AlreadyExists(uid.to_string()));
        }
        self.store.save(uid, &configuration)?;
        groups.insert(uid.to_string(), new_slot(ComponentGroup::new(uid, configuration)));
        drop(groups);

        info!(%uid, "component group registered");
        self.publish(RegistryEvent::GroupRegistered {
            uid: uid.to_string(),
        });
        Ok(())
    }

    /// Current in-memory configuration of a group.
    pub async fn read_configuration(&self, uid: &str) -> RegistryResult<Document> {
        self.read(uid, |group| Ok(group.configuration().clone())).await
    }

    /// Persist a configuration and apply it.
    ///
    /// Under [`WritePolicy::Upsert`] an unknown uid creates the group. The
    /// store is written first; if that fails memory is left as it was.
    pub async fn write_configuration(
        &self,
        uid: &str,
        configuration: Document,
    ) -> RegistryResult<()> {
        validate_identifier("group", uid)?;

        loop {
            let existing = self.groups.read().await.get(uid).cloned();

            if let Some(slot) = existing {
                let mut slot = slot.lock().await;
                if slot.removed {
                    // Deleted while we waited; the next pass sees it gone.
                    continue;
                }
                self.store.save(uid, &configuration)?;
                slot.group.set_configuration(configuration);
                drop(slot);

                debug!(%uid, "component group configuration updated");
                self.publish(RegistryEvent::ConfigurationChanged {
                    uid: uid.to_string(),
                });
                return Ok(());
            }

            if !self.options.write_policy.creates_missing() {
                return Err(RegistryError::GroupNotFound(uid.to_string()));
            }

            let mut groups = self.groups.write().await;
            if groups.contains_key(uid) {
                // Created concurrently; update it on the next pass.
                continue;
            }
            self.store.save(uid, &configuration)?;
            groups.insert(uid.to_string(), new_slot(ComponentGroup::new(uid, configuration)));
            drop(groups);

            info!(%uid, "component group registered");
            self.publish(RegistryEvent::GroupRegistered {
                uid: uid.to_string(),
            });
            return Ok(());
        }
    }

    /// Remove a group from memory and from the store.
    ///
    /// The group's own lock is taken before the collection write lock, so a
    /// delete waiting on a busy group does not stall lookups of other groups.
    pub async fn delete_group(&self, uid: &str) -> RegistryResult<()> {
        let mut slot = self.lock(uid).await?;

        let mut groups = self.groups.write().await;
        let existed = self.store.delete(uid)?;
        if !existed {
            warn!(%uid, "deleted component group had no stored configuration");
        }
        slot.removed = true;
        groups.remove(uid);
        drop(groups);
        drop(slot);

        info!(%uid, "component group deleted");
        self.publish(RegistryEvent::GroupDeleted {
            uid: uid.to_string(),
        });
        Ok(())
    }

    /// Move a group from registered to initialized.
    pub async fn initialize_group(&self, uid: &str) -> RegistryResult<()> {
        let policy = self.options.initialize_policy;
        let transitioned = self
            .mutate(uid, false, |group| {
                let transitioned = group.initialize(policy)?;
                let event = transitioned.then(|| RegistryEvent::GroupInitialized {
                    uid: uid.to_string(),
                });
                Ok((transitioned, event))
            })
            .await?;
        if transitioned {
            info!(%uid, "component group initialized");
        }
        Ok(())
    }

    // ── Components ─────────────────────────────────────────────────

    pub async fn assign_component(&self, uid: &str, component_uid: &str) -> RegistryResult<()> {
        validate_identifier("component", component_uid)?;
        self.mutate(uid, true, |group| {
            group.assign_component(component_uid)?;
            Ok((
                (),
                Some(RegistryEvent::ComponentAssigned {
                    uid: uid.to_string(),
                    component_uid: component_uid.to_string(),
                }),
            ))
        })
        .await?;
        debug!(%uid, %component_uid, "component assigned");
        Ok(())
    }

    /// Remove a component and all of its association settings.
    pub async fn unassign_component(&self, uid: &str, component_uid: &str) -> RegistryResult<()> {
        self.mutate(uid, true, |group| {
            group.unassign_component(component_uid)?;
            Ok((
                (),
                Some(RegistryEvent::ComponentUnassigned {
                    uid: uid.to_string(),
                    component_uid: component_uid.to_string(),
                }),
            ))
        })
        .await?;
        debug!(%uid, %component_uid, "component unassigned");
        Ok(())
    }

    pub async fn get_component_association_setting(
        &self,
        uid: &str,
        component_uid: &str,
        setting_uid: &str,
    ) -> RegistryResult<Value> {
        self.read(uid, |group| {
            group
                .component_setting(component_uid, setting_uid)
                .cloned()
        })
        .await
    }

    /// Insert or overwrite an association setting. Returns the replaced value.
    pub async fn set_component_association_setting(
        &self,
        uid: &str,
        component_uid: &str,
        setting_uid: &str,
        value: Value,
    ) -> RegistryResult<Option<Value>> {
        validate_identifier("setting", setting_uid)?;
        self.mutate(uid, true, |group| {
            let old_value = group.set_component_setting(component_uid, setting_uid, value.clone())?;
            let event = RegistryEvent::ComponentSettingChanged {
                uid: uid.to_string(),
                component_uid: component_uid.to_string(),
                setting_uid: setting_uid.to_string(),
                old_value: old_value.clone(),
                new_value: value,
            };
            Ok((old_value, Some(event)))
        })
        .await
    }

    /// Remove an association setting. Removing an absent key succeeds.
    pub async fn remove_component_association_setting(
        &self,
        uid: &str,
        component_uid: &str,
        setting_uid: &str,
    ) -> RegistryResult<Option<Value>> {
        self.mutate(uid, true, |group| {
            let old_value = group.remove_component_setting(component_uid, setting_uid)?;
            let event = old_value
                .clone()
                .map(|old_value| RegistryEvent::ComponentSettingRemoved {
                    uid: uid.to_string(),
                    component_uid: component_uid.to_string(),
                    setting_uid: setting_uid.to_string(),
                    old_value,
                });
            Ok((old_value, event))
        })
        .await
    }

    // ── Macros ─────────────────────────────────────────────────────

    pub async fn assign_macro(&self, uid: &str, macro_uid: &str) -> RegistryResult<()> {
        validate_identifier("macro", macro_uid)?;
        self.mutate(uid, true, |group| {
            group.assign_macro(macro_uid)?;
            Ok((
                (),
                Some(RegistryEvent::MacroAssigned {
                    uid: uid.to_string(),
                    macro_uid: macro_uid.to_string(),
                }),
            ))
        })
        .await?;
        debug!(%uid, %macro_uid, "macro assigned");
        Ok(())
    }

    pub async fn unassign_macro(&self, uid: &str, macro_uid: &str) -> RegistryResult<()> {
        self.mutate(uid, true, |group| {
            group.unassign_macro(macro_uid)?;
            Ok((
                (),
                Some(RegistryEvent::MacroUnassigned {
                    uid: uid.to_string(),
                    macro_uid: macro_uid.to_string(),
                }),
            ))
        })
        .await?;
        debug!(%uid, %macro_uid, "macro unassigned");
        Ok(())
    }

    // ── Group settings and status ──────────────────────────────────

    pub async fn get_group_setting(&self, uid: &str, setting_uid: &str) -> RegistryResult<Value> {
        self.read(uid, |group| group.setting(setting_uid).cloned()).await
    }

    /// Insert or overwrite a group setting. Returns the replaced value.
    pub async fn set_group_setting(
        &self,
        uid: &str,
        setting_uid: &str,
        value: Value,
    ) -> RegistryResult<Option<Value>> {
        validate_identifier("setting", setting_uid)?;
        self.mutate(uid, true, |group| {
            let old_value = group.set_setting(setting_uid, value.clone());
            let event = RegistryEvent::SettingChanged {
                uid: uid.to_string(),
                setting_uid: setting_uid.to_string(),
                old_value: old_value.clone(),
                new_value: value,
            };
            Ok((old_value, Some(event)))
        })
        .await
    }

    /// Remove a group setting. Removing an absent key succeeds.
    pub async fn remove_group_setting(
        &self,
        uid: &str,
        setting_uid: &str,
    ) -> RegistryResult<Option<Value>> {
        self.mutate(uid, true, |group| {
            let old_value = group.remove_setting(setting_uid);
            let event = old_value
                .clone()
                .map(|old_value| RegistryEvent::SettingRemoved {
                    uid: uid.to_string(),
                    setting_uid: setting_uid.to_string(),
                    old_value,
                });
            Ok((old_value, event))
        })
        .await
    }

    /// Snapshot of a group's settings, ordered by key.
    pub async fn get_settings(&self, uid: &str) -> RegistryResult<Vec<(String, Value)>> {
        self.read(uid, |group| Ok(group.settings().snapshot())).await
    }

    /// Snapshot of a group's status, ordered by key.
    pub async fn get_status(&self, uid: &str) -> RegistryResult<Vec<(String, Value)>> {
        self.read(uid, |group| Ok(group.status().snapshot())).await
    }

    /// Update a derived status value. Status is never persisted.
    pub async fn set_status(
        &self,
        uid: &str,
        status_uid: &str,
        value: Value,
    ) -> RegistryResult<Option<Value>> {
        validate_identifier("status", status_uid)?;
        self.mutate(uid, false, |group| {
            let old_value = group.set_status(status_uid, value.clone());
            let event = RegistryEvent::StatusChanged {
                uid: uid.to_string(),
                status_uid: status_uid.to_string(),
                old_value: old_value.clone(),
                new_value: value,
            };
            Ok((old_value, Some(event)))
        })
        .await
    }

    pub async fn remove_status(&self, uid: &str, status_uid: &str) -> RegistryResult<Option<Value>> {
        self.mutate(uid, false, |group| {
            let old_value = group.remove_status(status_uid);
            let event = old_value
                .clone()
                .map(|old_value| RegistryEvent::StatusRemoved {
                    uid: uid.to_string(),
                    status_uid: status_uid.to_string(),
                    old_value,
                });
            Ok((old_value, event))
        })
        .await
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Lock a live group. A group deleted while we waited is not found.
    async fn lock(&self, uid: &str) -> RegistryResult<OwnedMutexGuard<GroupSlot>> {
        let slot = self
            .groups
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| RegistryError::GroupNotFound(uid.to_string()))?;
        let slot = slot.lock_owned().await;
        if slot.removed {
            return Err(RegistryError::GroupNotFound(uid.to_string()));
        }
        Ok(slot)
    }

    async fn read<T, F>(&self, uid: &str, f: F) -> RegistryResult<T>
    where
        F: FnOnce(&ComponentGroup) -> RegistryResult<T>,
    {
        let slot = self.lock(uid).await?;
        f(&slot.group)
    }

    /// Apply `f` to a group under its lock.
    ///
    /// `f` returns its result plus the event describing the change, or `None`
    /// if nothing changed. When `persist` is set and state persistence is on,
    /// `f` runs against a copy; the copy is saved and only then swapped in.
    async fn mutate<T, F>(&self, uid: &str, persist: bool, f: F) -> RegistryResult<T>
    where
        F: FnOnce(&mut ComponentGroup) -> RegistryResult<(T, Option<RegistryEvent>)>,
    {
        let mut slot = self.lock(uid).await?;

        let (out, event) = if persist && self.options.persist_state {
            let mut staged = slot.group.clone();
            let (out, event) = f(&mut staged)?;
            if event.is_some() {
                self.store.save_state(uid, &staged.to_state_record())?;
                slot.group = staged;
            }
            (out, event)
        } else {
            f(&mut slot.group)?
        };

        if let Some(event) = event {
            self.publish(event);
        }
        Ok(out)
    }

    fn publish(&self, event: RegistryEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
