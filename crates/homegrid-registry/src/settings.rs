//! String-keyed value map used for group settings, group status and
//! per-association settings.
//!
//! The map has no interior locking. It is owned by a [`ComponentGroup`], and
//! the registry's per-group lock is the one synchronization boundary for it.
//!
//! [`ComponentGroup`]: crate::group::ComponentGroup

use std::collections::BTreeMap;

use homegrid_core::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned by [`SettingsMap::get`] when the key is absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("key not found: {0}")]
pub struct KeyNotFound(pub String);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsMap {
    entries: BTreeMap<String, Value>,
}

impl SettingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Result<&Value, KeyNotFound> {
        self.entries
            .get(key)
            .ok_or_else(|| KeyNotFound(key.to_string()))
    }

    /// Insert or overwrite a value. Returns the value it replaced.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Remove a key. Removing an absent key is not an error.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Point-in-time copy of all entries, ordered by key.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.entries
    }
}

impl From<BTreeMap<String, Value>> for SettingsMap {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, Value)> for SettingsMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
