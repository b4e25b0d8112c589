use std::sync::Arc;

use crate::clock::Clock;
use crate::sync::SharedStateChannel;
use crate::timer::TimerMirror;

/// Content mounted into the companion surface. `render` is called with the
/// latest mirror on every reconciled update; `unmount` exactly once when the
/// surface goes away, however it goes away.
pub trait CompanionView: Send + 'static {
    fn render(&mut self, mirror: &TimerMirror);

    fn unmount(&mut self) {}
}

/// The companion side's only link to the timer: its own channel handle on
/// the shared key. It mirrors `{elapsed_seconds, running}` read-only and
/// requests transitions by bumping the edge counters; it never calls the
/// engine.
#[derive(Clone)]
pub struct CompanionRemote {
    channel: SharedStateChannel<TimerMirror>,
    clock: Arc<dyn Clock>,
}

impl CompanionRemote {
    pub(crate) fn new(channel: SharedStateChannel<TimerMirror>, clock: Arc<dyn Clock>) -> Self {
        Self { channel, clock }
    }

    pub async fn mirror(&self) -> TimerMirror {
        self.channel.read().await
    }

    pub async fn request_pause(&self) {
        let now = self.clock.now();
        self.channel
            .update(|mirror| {
                mirror.pause_requests += 1;
                mirror.pause_signaled_at = Some(now);
            })
            .await;
    }

    pub async fn request_resume(&self) {
        let now = self.clock.now();
        self.channel
            .update(|mirror| {
                mirror.resume_requests += 1;
                mirror.resume_signaled_at = Some(now);
            })
            .await;
    }
}
