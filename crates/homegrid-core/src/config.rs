//! homegrid.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{InitializePolicy, WritePolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomegridConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the redb file holding group configurations.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub write_policy: WritePolicy,
    #[serde(default)]
    pub initialize_policy: InitializePolicy,
    /// Persist group settings and component/macro associations next to the
    /// configuration document.
    #[serde(default = "default_true")]
    pub persist_state: bool,
    /// Initialize every group registered by a store load.
    #[serde(default)]
    pub initialize_on_load: bool,
    /// Capacity of the registry change-event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::default(),
            initialize_policy: InitializePolicy::default(),
            persist_state: true,
            initialize_on_load: false,
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/var/lib/homegrid/groups.redb")
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    256
}

impl HomegridConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HomegridConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: HomegridConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.path, default_store_path());
        assert_eq!(config.registry.write_policy, WritePolicy::Upsert);
        assert_eq!(config.registry.initialize_policy, InitializePolicy::Strict);
        assert!(config.registry.persist_state);
        assert!(!config.registry.initialize_on_load);
        assert_eq!(config.registry.event_capacity, 256);
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[store]
path = "/tmp/groups.redb"

[registry]
write_policy = "require_existing"
initialize_policy = "idempotent"
persist_state = false
initialize_on_load = true
event_capacity = 16
"#;
        let config: HomegridConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/groups.redb"));
        assert_eq!(config.registry.write_policy, WritePolicy::RequireExisting);
        assert_eq!(config.registry.initialize_policy, InitializePolicy::Idempotent);
        assert!(!config.registry.persist_state);
        assert!(config.registry.initialize_on_load);
        assert_eq!(config.registry.event_capacity, 16);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let toml_str = r#"
[registry]
write_policy = "sometimes"
"#;
        assert!(toml::from_str::<HomegridConfig>(toml_str).is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = HomegridConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("write_policy"));
        let parsed: HomegridConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.store.path, config.store.path);
    }
}
