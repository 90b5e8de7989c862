//! Concurrent access: no lost updates, linearizable per-group operations,
//! and deletes that never race mutations into a detached group.

mod common;

use std::sync::Arc;
use std::time::Duration;

use homegrid_registry::*;
use homegrid_state::ConfigurationStore;
use serde_json::json;

use common::{FlakyStore, memory_registry};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_assigns_lose_nothing() {
    let registry = Arc::new(memory_registry());
    registry.write_configuration("kitchen", json!({})).await.unwrap();

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .assign_component("kitchen", &format!("light{i}"))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let group = registry.get_group("kitchen").await.unwrap();
    assert_eq!(group.components().len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_assign_succeeds_once() {
    let registry = Arc::new(memory_registry());
    registry.write_configuration("kitchen", json!({})).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.assign_component("kitchen", "light1").await })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::AlreadyAssigned),
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settings_on_different_groups() {
    let registry = Arc::new(memory_registry());
    for g in 0..8 {
        registry.write_configuration(&format!("group{g}"), json!({})).await.unwrap();
    }

    let handles: Vec<_> = (0..8)
        .flat_map(|g| (0..16).map(move |k| (g, k)))
        .map(|(g, k)| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .set_group_setting(&format!("group{g}"), &format!("key{k}"), json!(k))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for g in 0..8 {
        assert_eq!(registry.get_settings(&format!("group{g}")).await.unwrap().len(), 16);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_create_one_group() {
    let registry = Arc::new(memory_registry());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry.write_configuration("kitchen", json!({"writer": i})).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(registry.len().await, 1);
    let doc = registry.read_configuration("kitchen").await.unwrap();
    assert!(doc["writer"].is_u64());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_racing_assign_never_leaves_a_detached_success() {
    let store = FlakyStore::new();
    let registry = Arc::new(Registry::new(store.clone(), RegistryOptions::default()));

    for round in 0..32 {
        let uid = format!("group{round}");
        registry.write_configuration(&uid, json!({})).await.unwrap();

        let assign = {
            let registry = registry.clone();
            let uid = uid.clone();
            tokio::spawn(async move { registry.assign_component(&uid, "light1").await })
        };
        let delete = {
            let registry = registry.clone();
            let uid = uid.clone();
            tokio::spawn(async move { registry.delete_group(&uid).await })
        };

        delete.await.unwrap().unwrap();
        match assign.await.unwrap() {
            Ok(()) => {}
            Err(e) => assert!(e.is_not_found(), "unexpected error: {e}"),
        }

        // Either way the group is gone, in memory and in the store.
        assert!(registry.get_group(&uid).await.unwrap_err().is_not_found());
        assert!(store.load(&uid).unwrap().is_none());
        assert!(store.load_state(&uid).unwrap().is_none());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn list_groups_during_churn_sees_whole_groups() {
    let registry = Arc::new(memory_registry());

    let writer = {
        let registry = registry.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                let uid = format!("group{i}");
                registry.write_configuration(&uid, json!({"n": i})).await.unwrap();
                registry.assign_component(&uid, "light1").await.unwrap();
                if i % 2 == 0 {
                    registry.delete_group(&uid).await.unwrap();
                }
            }
        })
    };

    for _ in 0..50 {
        for group in registry.list_groups().await {
            assert_eq!(group.configuration()["n"], json!(group.uid()[5..].parse::<u64>().unwrap()));
        }
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();

    assert_eq!(registry.len().await, 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_during_load_is_not_undone() {
    let store = FlakyStore::new();
    store.save("kitchen", &json!({"v": 1})).unwrap();
    let registry = Arc::new(Registry::new(store.clone(), RegistryOptions::default()));

    store.slow_down(Duration::from_millis(300));
    let load = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.load_from_store().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Lands while the loader is still reading "kitchen" from the store.
    registry.write_configuration("kitchen", json!({"v": 2})).await.unwrap();
    registry.delete_group("kitchen").await.unwrap();
    load.await.unwrap().unwrap();
    store.slow_down(Duration::ZERO);

    assert!(!registry.contains("kitchen").await);
    assert!(store.load("kitchen").unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_waiting_on_busy_group_does_not_block_others() {
    let store = FlakyStore::new();
    let registry = Arc::new(Registry::new(store.clone(), RegistryOptions::default()));
    registry.write_configuration("kitchen", json!({})).await.unwrap();
    registry.write_configuration("garage", json!({})).await.unwrap();

    // The assign holds the kitchen lock across a slow state save.
    store.slow_down(Duration::from_millis(300));
    let assign = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.assign_component("kitchen", "light1").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let delete = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.delete_group("kitchen").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let garage = tokio::time::timeout(Duration::from_millis(150), registry.get_group("garage"))
        .await
        .expect("lookup of another group stalled behind the delete");
    assert!(garage.is_ok());

    assign.await.unwrap().unwrap();
    delete.await.unwrap().unwrap();
    store.slow_down(Duration::ZERO);
    assert!(!registry.contains("kitchen").await);
    assert!(store.load_state("kitchen").unwrap().is_none());
}
