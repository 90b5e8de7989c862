//! StateStore — redb-backed persistence for component group configuration.
//!
//! Values are JSON-serialized into redb's `&[u8]` value columns. The store
//! supports both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use homegrid_core::Document;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::GroupStateRecord;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Durable storage of group configuration, addressed by group uid.
///
/// Implementations must be safe for concurrent access to distinct keys; the
/// registry serializes access per group on its side.
pub trait ConfigurationStore: Send + Sync {
    /// Load a configuration document. `None` if the group was never saved.
    fn load(&self, uid: &str) -> StateResult<Option<Document>>;

    /// Insert or replace a configuration document.
    fn save(&self, uid: &str, configuration: &Document) -> StateResult<()>;

    /// Delete the configuration and any persisted state of a group.
    /// Returns true if a configuration existed.
    fn delete(&self, uid: &str) -> StateResult<bool>;

    /// Uids of every group with a stored configuration, in key order.
    fn list_uids(&self) -> StateResult<Vec<String>>;

    /// Load the persisted settings and associations of a group.
    fn load_state(&self, uid: &str) -> StateResult<Option<GroupStateRecord>>;

    /// Insert or replace the persisted settings and associations of a group.
    fn save_state(&self, uid: &str, record: &GroupStateRecord) -> StateResult<()>;
}

/// Thread-safe configuration store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "configuration store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory configuration store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CONFIGURATIONS).map_err(map_err!(Table))?;
        txn.open_table(GROUP_STATE).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> StateResult<()> {
        let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

impl ConfigurationStore for StateStore {
    fn load(&self, uid: &str) -> StateResult<Option<Document>> {
        self.get_json(CONFIGURATIONS, uid)
    }

    fn save(&self, uid: &str, configuration: &Document) -> StateResult<()> {
        self.put_json(CONFIGURATIONS, uid, configuration)?;
        debug!(%uid, "group configuration stored");
        Ok(())
    }

    fn delete(&self, uid: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut configurations = txn.open_table(CONFIGURATIONS).map_err(map_err!(Table))?;
            existed = configurations.remove(uid).map_err(map_err!(Write))?.is_some();
            let mut state = txn.open_table(GROUP_STATE).map_err(map_err!(Table))?;
            state.remove(uid).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%uid, existed, "group configuration deleted");
        Ok(existed)
    }

    fn list_uids(&self) -> StateResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CONFIGURATIONS).map_err(map_err!(Table))?;
        let mut uids = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            uids.push(key.value().to_string());
        }
        Ok(uids)
    }

    fn load_state(&self, uid: &str) -> StateResult<Option<GroupStateRecord>> {
        self.get_json(GROUP_STATE, uid)
    }

    fn save_state(&self, uid: &str, record: &GroupStateRecord) -> StateResult<()> {
        self.put_json(GROUP_STATE, uid, record)?;
        debug!(%uid, "group state stored");
        Ok(())
    }
}
