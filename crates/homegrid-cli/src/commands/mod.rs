pub mod assign;
pub mod group;
pub mod settings;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use homegrid_core::{HomegridConfig, Value};
use homegrid_registry::{Registry, RegistryOptions};
use homegrid_state::StateStore;
use serde::Serialize;
use tracing::debug;

/// Open the store and load every group into a fresh registry.
pub async fn open_registry(config_path: Option<&Path>, db: Option<&Path>) -> anyhow::Result<Registry> {
    let config = match config_path {
        Some(path) => HomegridConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => HomegridConfig::default(),
    };
    let db_path = db.map(Path::to_path_buf).unwrap_or(config.store.path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    debug!(path = %db_path.display(), "opening component group store");
    let store = StateStore::open(&db_path)
        .with_context(|| format!("failed to open store {}", db_path.display()))?;
    let registry = Registry::open(Arc::new(store), RegistryOptions::from(&config.registry)).await?;
    Ok(registry)
}

/// Parse a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse a configuration document: inline JSON, or `@path` for a file.
pub fn parse_document(raw: &str) -> anyhow::Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document {path}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("configuration document is not valid JSON")
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
