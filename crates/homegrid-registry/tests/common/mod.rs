//! Shared fixtures for registry integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use homegrid_core::Document;
use homegrid_registry::{Registry, RegistryOptions};
use homegrid_state::{ConfigurationStore, GroupStateRecord, StateError, StateResult, StateStore};

/// In-memory store that can be told to fail writes or specific loads.
pub struct FlakyStore {
    inner: StateStore,
    fail_writes: AtomicBool,
    poisoned: Mutex<HashSet<String>>,
    delay_ms: AtomicU64,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: StateStore::open_in_memory().unwrap(),
            fail_writes: AtomicBool::new(false),
            poisoned: Mutex::new(HashSet::new()),
            delay_ms: AtomicU64::new(0),
        })
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every load of `uid` fail with a deserialization error.
    pub fn poison(&self, uid: &str) {
        self.poisoned.lock().unwrap().insert(uid.to_string());
    }

    /// Block every `load` and `save_state` call for `delay`.
    ///
    /// The store is synchronous, so the delay holds whatever registry lock
    /// the caller holds. Use with a multi-thread runtime.
    pub fn slow_down(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn stall(&self) {
        let ms = self.delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }

    fn check_write(&self) -> StateResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StateError::Write("injected failure".into()));
        }
        Ok(())
    }

    fn check_load(&self, uid: &str) -> StateResult<()> {
        if self.poisoned.lock().unwrap().contains(uid) {
            return Err(StateError::Deserialize("injected corruption".into()));
        }
        Ok(())
    }
}

impl ConfigurationStore for FlakyStore {
    fn load(&self, uid: &str) -> StateResult<Option<Document>> {
        self.stall();
        self.check_load(uid)?;
        self.inner.load(uid)
    }

    fn save(&self, uid: &str, configuration: &Document) -> StateResult<()> {
        self.check_write()?;
        self.inner.save(uid, configuration)
    }

    fn delete(&self, uid: &str) -> StateResult<bool> {
        self.check_write()?;
        self.inner.delete(uid)
    }

    fn list_uids(&self) -> StateResult<Vec<String>> {
        self.inner.list_uids()
    }

    fn load_state(&self, uid: &str) -> StateResult<Option<GroupStateRecord>> {
        self.check_load(uid)?;
        self.inner.load_state(uid)
    }

    fn save_state(&self, uid: &str, record: &GroupStateRecord) -> StateResult<()> {
        self.stall();
        self.check_write()?;
        self.inner.save_state(uid, record)
    }
}

pub fn flaky_registry(options: RegistryOptions) -> (Arc<FlakyStore>, Registry) {
    let store = FlakyStore::new();
    let registry = Registry::new(store.clone(), options);
    (store, registry)
}

pub fn memory_registry() -> Registry {
    let store = Arc::new(StateStore::open_in_memory().unwrap());
    Registry::new(store, RegistryOptions::default())
}
