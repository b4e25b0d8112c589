use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::{interval, MissedTickBehavior};

use super::channel::WeakInner;

/// Fixed-interval pull loop: the reconciliation path of record. Runs
/// regardless of timer phase so control signals from the companion surface
/// are observed even while the primary surface is idle. Holds only a weak
/// reference to the channel, so dropping the last handle stops the loop.
pub(crate) fn spawn_poller<T>(inner: WeakInner<T>, poll_interval: Duration)
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let cancel = match inner.upgrade() {
        Some(strong) => strong.cancel_token(),
        None => return,
    };

    tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(strong) = inner.upgrade() else { break };
                    strong.reconcile().await;
                }
                _ = cancel.cancelled() => break,
            }
        }
    });
}
