use homegrid_registry::Registry;

use super::{parse_value, print_json};

pub async fn get_group(registry: &Registry, uid: &str, key: &str) -> anyhow::Result<()> {
    print_json(&registry.get_group_setting(uid, key).await?)
}

pub async fn set_group(registry: &Registry, uid: &str, key: &str, value: &str) -> anyhow::Result<()> {
    registry.set_group_setting(uid, key, parse_value(value)).await?;
    println!("✓ Setting {key} of {uid} written");
    Ok(())
}

pub async fn remove_group(registry: &Registry, uid: &str, key: &str) -> anyhow::Result<()> {
    match registry.remove_group_setting(uid, key).await? {
        Some(_) => println!("✓ Setting {key} of {uid} removed"),
        None => println!("Setting {key} of {uid} was not set"),
    }
    Ok(())
}

pub async fn get_association(
    registry: &Registry,
    uid: &str,
    component: &str,
    key: &str,
) -> anyhow::Result<()> {
    print_json(
        &registry
            .get_component_association_setting(uid, component, key)
            .await?,
    )
}

pub async fn set_association(
    registry: &Registry,
    uid: &str,
    component: &str,
    key: &str,
    value: &str,
) -> anyhow::Result<()> {
    registry
        .set_component_association_setting(uid, component, key, parse_value(value))
        .await?;
    println!("✓ Setting {key} of {component} in {uid} written");
    Ok(())
}

pub async fn remove_association(
    registry: &Registry,
    uid: &str,
    component: &str,
    key: &str,
) -> anyhow::Result<()> {
    match registry
        .remove_component_association_setting(uid, component, key)
        .await?
    {
        Some(_) => println!("✓ Setting {key} of {component} in {uid} removed"),
        None => println!("Setting {key} of {component} in {uid} was not set"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use homegrid_registry::RegistryOptions;
    use homegrid_state::StateStore;
    use serde_json::json;

    #[tokio::test]
    async fn association_values_are_parsed() {
        let registry = Registry::new(
            Arc::new(StateStore::open_in_memory().unwrap()),
            RegistryOptions::default(),
        );
        registry.write_configuration("kitchen", json!({})).await.unwrap();
        crate::commands::assign::assign_component(&registry, "kitchen", "light1")
            .await
            .unwrap();

        set_association(&registry, "kitchen", "light1", "brightness", "80").await.unwrap();
        set_group(&registry, "kitchen", "caption", "Kitchen").await.unwrap();

        assert_eq!(
            registry
                .get_component_association_setting("kitchen", "light1", "brightness")
                .await
                .unwrap(),
            json!(80)
        );
        assert_eq!(
            registry.get_group_setting("kitchen", "caption").await.unwrap(),
            json!("Kitchen")
        );

        remove_association(&registry, "kitchen", "light1", "brightness").await.unwrap();
        remove_association(&registry, "kitchen", "light1", "brightness").await.unwrap();
        assert!(get_association(&registry, "kitchen", "light1", "brightness").await.is_err());
    }
}
