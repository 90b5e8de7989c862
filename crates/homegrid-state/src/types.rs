//! Persisted record types.

use std::collections::{BTreeMap, BTreeSet};

use homegrid_core::{ComponentUid, MacroUid, Value};
use serde::{Deserialize, Serialize};

/// Settings and associations of one group as written to the store.
///
/// Status and the initialized flag are runtime-only and never appear here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStateRecord {
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    /// Assigned components with their association settings.
    #[serde(default)]
    pub components: BTreeMap<ComponentUid, BTreeMap<String, Value>>,
    #[serde(default)]
    pub macros: BTreeSet<MacroUid>,
}

impl GroupStateRecord {
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty() && self.components.is_empty() && self.macros.is_empty()
    }
}
