use homegrid_core::Value;
use homegrid_registry::Registry;
use serde_json::Map;

use super::{parse_document, print_json};

pub async fn list(registry: &Registry) -> anyhow::Result<()> {
    print_json(&registry.list_groups().await)
}

pub async fn show(registry: &Registry, uid: &str) -> anyhow::Result<()> {
    print_json(&registry.get_group(uid).await?)
}

/// Group settings as one JSON object, keys in order.
pub async fn settings(registry: &Registry, uid: &str) -> anyhow::Result<()> {
    print_json(&to_object(registry.get_settings(uid).await?))
}

/// Status is never persisted, so a freshly opened registry reports it empty.
pub async fn status(registry: &Registry, uid: &str) -> anyhow::Result<()> {
    print_json(&to_object(registry.get_status(uid).await?))
}

fn to_object(entries: Vec<(String, Value)>) -> Map<String, Value> {
    entries.into_iter().collect()
}

pub async fn delete(registry: &Registry, uid: &str) -> anyhow::Result<()> {
    registry.delete_group(uid).await?;
    println!("✓ Deleted component group {uid}");
    Ok(())
}

pub async fn get_config(registry: &Registry, uid: &str) -> anyhow::Result<()> {
    print_json(&registry.read_configuration(uid).await?)
}

pub async fn set_config(registry: &Registry, uid: &str, document: &str) -> anyhow::Result<()> {
    let document = parse_document(document)?;
    registry.write_configuration(uid, document).await?;
    println!("✓ Configuration of {uid} written");
    Ok(())
}
