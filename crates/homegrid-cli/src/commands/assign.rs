use homegrid_registry::Registry;

pub async fn assign_component(registry: &Registry, uid: &str, component: &str) -> anyhow::Result<()> {
    registry.assign_component(uid, component).await?;
    println!("✓ Component {component} assigned to {uid}");
    Ok(())
}

pub async fn unassign_component(
    registry: &Registry,
    uid: &str,
    component: &str,
) -> anyhow::Result<()> {
    registry.unassign_component(uid, component).await?;
    println!("✓ Component {component} unassigned from {uid}");
    Ok(())
}

pub async fn assign_macro(registry: &Registry, uid: &str, macro_uid: &str) -> anyhow::Result<()> {
    registry.assign_macro(uid, macro_uid).await?;
    println!("✓ Macro {macro_uid} assigned to {uid}");
    Ok(())
}

pub async fn unassign_macro(registry: &Registry, uid: &str, macro_uid: &str) -> anyhow::Result<()> {
    registry.unassign_macro(uid, macro_uid).await?;
    println!("✓ Macro {macro_uid} unassigned from {uid}");
    Ok(())
}
