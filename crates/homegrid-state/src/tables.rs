//! redb table definitions for the configuration store.

use redb::TableDefinition;

/// Group configuration documents keyed by group uid.
pub const CONFIGURATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("configurations");

/// Persisted settings and associations keyed by group uid.
pub const GROUP_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("group_state");
