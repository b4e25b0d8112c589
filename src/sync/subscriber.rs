use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use super::channel::WeakInner;
use super::store::ChangeNote;

/// Push path: reconcile immediately on a foreign change note for our key.
/// Purely a latency optimization over the poller; lagged or dropped notes
/// are fine because the pull path re-reads on its own schedule.
pub(crate) fn spawn_subscriber<T>(inner: WeakInner<T>, mut notes: broadcast::Receiver<ChangeNote>)
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let cancel = match inner.upgrade() {
        Some(strong) => strong.cancel_token(),
        None => return,
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                note = notes.recv() => {
                    match note {
                        Ok(note) => {
                            let Some(strong) = inner.upgrade() else { break };
                            let (key, origin) = strong.key_and_origin();
                            if note.key == key && note.origin != origin {
                                strong.reconcile().await;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }
    });
}
