use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::log_info;

use super::poller::spawn_poller;
use super::store::SharedStore;
use super::subscriber::spawn_subscriber;

// Per-reconciliation logging; noisy at sub-second poll intervals.
const ENABLE_LOGS: bool = false;

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Fixed pull interval. Sub-second, so control signals are observed
    /// promptly even when notifications never arrive.
    pub poll_interval: Duration,
    /// Enable the push path. The channel is fully correct without it.
    pub push_enabled: bool,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            push_enabled: true,
        }
    }
}

/// Last-known local copy of one shared key. The snapshot string is the
/// canonical serialization, compared by identity for change detection.
#[derive(Debug, Clone)]
pub struct ChannelRecord<T> {
    pub value: T,
    pub snapshot: String,
}

pub(crate) struct ChannelInner<T> {
    store: Arc<dyn SharedStore>,
    key: String,
    /// Identifies this channel instance in change notes, so the push path
    /// can skip notes for its own writes.
    origin: Uuid,
    local: Mutex<ChannelRecord<T>>,
    /// Snapshot of a write the store rejected, retried on the next
    /// reconciliation tick.
    pending_write: Mutex<Option<String>>,
    external_tx: watch::Sender<T>,
    cancel: CancellationToken,
}

/// Typed handle on one key of the shared store. Cloneable; all clones share
/// the same local record and background tasks. Reads and writes never error
/// to the caller: store faults degrade to the last-known value and deferred
/// retries.
pub struct SharedStateChannel<T> {
    inner: Arc<ChannelInner<T>>,
}

impl<T> Clone for SharedStateChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SharedStateChannel<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn open(
        store: Arc<dyn SharedStore>,
        key: impl Into<String>,
        initial: T,
        options: ChannelOptions,
    ) -> Self {
        let key = key.into();
        let snapshot = match serde_json::to_string(&initial) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("channel '{key}': failed to encode initial value: {err}");
                String::new()
            }
        };

        let (external_tx, _) = watch::channel(initial.clone());
        let inner = Arc::new(ChannelInner {
            store: store.clone(),
            key: key.clone(),
            origin: Uuid::new_v4(),
            local: Mutex::new(ChannelRecord {
                value: initial,
                snapshot,
            }),
            pending_write: Mutex::new(None),
            external_tx,
            cancel: CancellationToken::new(),
        });

        spawn_poller(Arc::downgrade(&inner), options.poll_interval);
        if options.push_enabled {
            spawn_subscriber(Arc::downgrade(&inner), store.watch());
        }

        Self { inner }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Pull-reconcile, then return the local value. Falls back to the
    /// last-known value (the initial value if nothing was ever reconciled)
    /// when the store is unreachable or the payload fails to decode.
    pub async fn read(&self) -> T {
        self.inner.reconcile().await;
        self.inner.local.lock().unwrap().value.clone()
    }

    /// Return the local value without touching the store.
    pub fn last_known(&self) -> T {
        self.inner.local.lock().unwrap().value.clone()
    }

    /// Replace the whole shared value. The local record is installed before
    /// the store save so this context's own write is never mistaken for an
    /// external change when it comes back around. Save failures are deferred
    /// to the next reconciliation tick, never surfaced to the caller.
    pub async fn write(&self, value: T) {
        let snapshot = match serde_json::to_string(&value) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("channel '{}': failed to encode value: {err}", self.inner.key);
                return;
            }
        };

        {
            let mut local = self.inner.local.lock().unwrap();
            local.value = value;
            local.snapshot = snapshot.clone();
        }

        match self.inner.store.save(&self.inner.key, &snapshot, self.inner.origin).await {
            Ok(()) => {
                self.inner.pending_write.lock().unwrap().take();
            }
            Err(err) => {
                warn!("channel '{}': write deferred: {err}", self.inner.key);
                *self.inner.pending_write.lock().unwrap() = Some(snapshot);
            }
        }
    }

    /// Mutate a copy of the last-known local value, then [`write`](Self::write)
    /// the whole result. The top-level value is always replaced in full;
    /// per-field diffing across contexts is not supported.
    pub async fn update(&self, mutate: impl FnOnce(&mut T)) {
        let mut value = self.last_known();
        mutate(&mut value);
        self.write(value).await;
    }

    /// Externally-originated updates only; this context's own writes are
    /// never delivered here.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.external_tx.subscribe()
    }

    /// Stop the poller and subscriber tasks. Also happens when the last
    /// handle is dropped; a poller outliving its surface is a resource leak.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }
}

impl<T> ChannelInner<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn key_and_origin(&self) -> (&str, Uuid) {
        (&self.key, self.origin)
    }

    /// One reconciliation step, shared by the pull and push paths.
    ///
    /// While a deferred write is pending the local value is newer than the
    /// store, so the retry happens instead of the pull: reconciling from the
    /// store in that window would roll the local write back.
    pub(crate) async fn reconcile(&self) {
        let pending = self.pending_write.lock().unwrap().clone();
        if let Some(snapshot) = pending {
            match self.store.save(&self.key, &snapshot, self.origin).await {
                Ok(()) => {
                    let mut guard = self.pending_write.lock().unwrap();
                    if guard.as_deref() == Some(snapshot.as_str()) {
                        guard.take();
                    }
                }
                Err(err) => {
                    warn!("channel '{}': deferred write still failing: {err}", self.key);
                }
            }
            return;
        }

        let stored = match self.store.load(&self.key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return,
            Err(err) => {
                warn!(
                    "channel '{}': store read failed, keeping last known value: {err}",
                    self.key
                );
                return;
            }
        };

        if self.local.lock().unwrap().snapshot == stored {
            return;
        }

        match serde_json::from_str::<T>(&stored) {
            Ok(value) => {
                log_info!("channel '{}': applying external snapshot", self.key);
                {
                    let mut local = self.local.lock().unwrap();
                    local.value = value.clone();
                    local.snapshot = stored;
                }
                let _ = self.external_tx.send(value);
            }
            Err(err) => {
                warn!("channel '{}': ignoring undecodable snapshot: {err}", self.key);
            }
        }
    }
}

impl<T> Drop for ChannelInner<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub(crate) type WeakInner<T> = Weak<ChannelInner<T>>;
