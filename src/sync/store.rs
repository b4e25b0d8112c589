use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::Database;
use crate::error::ChannelIoError;

/// Best-effort change notification. `origin` identifies the channel instance
/// that performed the write so subscribers can skip their own writes.
#[derive(Debug, Clone)]
pub struct ChangeNote {
    pub key: String,
    pub origin: Uuid,
}

/// Durable key-value store shared by every execution context. Snapshots are
/// opaque serialized strings; the store never interprets them.
#[async_trait]
pub trait SharedStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, ChannelIoError>;

    async fn save(&self, key: &str, snapshot: &str, origin: Uuid) -> Result<(), ChannelIoError>;

    /// Change notifications are best-effort: delivery may lag or drop, and
    /// the pull path must stay correct without them.
    fn watch(&self) -> broadcast::Receiver<ChangeNote>;
}

/// In-memory store for tests and headless embeddings.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    notes: broadcast::Sender<ChangeNote>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (notes, _) = broadcast::channel(64);
        Self {
            entries: Mutex::new(HashMap::new()),
            notes,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the store becoming unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn snapshot_of(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn check_online(&self) -> Result<(), ChannelIoError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ChannelIoError::Store("store is offline".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>, ChannelIoError> {
        self.check_online()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, key: &str, snapshot: &str, origin: Uuid) -> Result<(), ChannelIoError> {
        self.check_online()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), snapshot.to_string());
        let _ = self.notes.send(ChangeNote {
            key: key.to_string(),
            origin,
        });
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<ChangeNote> {
        self.notes.subscribe()
    }
}

/// SQLite-backed store: snapshots persist in the `shared_state` table,
/// change notes ride an in-process broadcast.
pub struct SqliteSharedStore {
    db: Database,
    notes: broadcast::Sender<ChangeNote>,
}

impl SqliteSharedStore {
    pub fn new(db: Database) -> Self {
        let (notes, _) = broadcast::channel(64);
        Self { db, notes }
    }
}

#[async_trait]
impl SharedStore for SqliteSharedStore {
    async fn load(&self, key: &str) -> Result<Option<String>, ChannelIoError> {
        self.db
            .get_shared_state(key)
            .await
            .map_err(|err| ChannelIoError::Store(err.to_string()))
    }

    async fn save(&self, key: &str, snapshot: &str, origin: Uuid) -> Result<(), ChannelIoError> {
        self.db
            .set_shared_state(key, snapshot)
            .await
            .map_err(|err| ChannelIoError::Store(err.to_string()))?;
        let _ = self.notes.send(ChangeNote {
            key: key.to_string(),
            origin,
        });
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<ChangeNote> {
        self.notes.subscribe()
    }
}
