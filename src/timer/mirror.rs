use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The value shared on the timer's channel key. The primary context owns
/// `elapsed_seconds` and `running`; the companion surface mirrors them
/// read-only and requests transitions through the counters.
///
/// The counters are edge-triggered signals: a boolean flag can be coalesced
/// or missed across poll cycles, but a strictly increasing counter observed
/// to differ from its last-seen value is a reliable one-shot edge even under
/// lossy periodic observation. The primary consumes a signal exactly once
/// and writes the counter back to zero. The `*_signaled_at` stamps order
/// conflicting signals that land within one observation window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerMirror {
    pub elapsed_seconds: u64,
    pub running: bool,
    pub pause_requests: u32,
    pub resume_requests: u32,
    pub pause_signaled_at: Option<DateTime<Utc>>,
    pub resume_signaled_at: Option<DateTime<Utc>>,
}

impl TimerMirror {
    pub fn has_signals(&self) -> bool {
        self.pause_requests > 0 || self.resume_requests > 0
    }
}
