use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running,
    Paused,
}

/// The timer's ground-truth state. Elapsed time is always derived as
/// `now - anchor`, so missed ticks and scheduler jitter cannot drift it;
/// `elapsed_secs` holds the accumulated duration as of the last transition
/// or poll. Invariant: `phase == Running` implies `anchor` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: TimerPhase,
    pub anchor: Option<DateTime<Utc>>,
    pub elapsed_secs: u64,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        if let (TimerPhase::Running, Some(anchor)) = (self.phase, self.anchor) {
            (now - anchor).num_seconds().max(0) as u64
        } else {
            self.elapsed_secs
        }
    }

    pub fn sync_elapsed_from_anchor(&mut self, now: DateTime<Utc>) {
        self.elapsed_secs = self.current_elapsed_secs(now);
    }

    /// Rebase the anchor so `now - anchor` continues from the accumulated
    /// elapsed time, then run.
    pub fn begin_running(&mut self, now: DateTime<Utc>) {
        self.anchor = Some(now - Duration::seconds(self.elapsed_secs as i64));
        self.phase = TimerPhase::Running;
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.sync_elapsed_from_anchor(now);
        self.anchor = None;
        self.phase = TimerPhase::Paused;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, secs).unwrap()
    }

    #[test]
    fn anchor_rebase_resumes_from_accumulated_elapsed() {
        let mut state = TimerState::new();
        state.begin_running(at(0));
        assert_eq!(state.phase, TimerPhase::Running);
        assert_eq!(state.current_elapsed_secs(at(10)), 10);

        state.pause(at(10));
        assert_eq!(state.phase, TimerPhase::Paused);
        assert_eq!(state.elapsed_secs, 10);
        assert!(state.anchor.is_none());

        // Paused time does not count; elapsed continues from 10 on resume.
        state.begin_running(at(40));
        assert_eq!(state.current_elapsed_secs(at(45)), 15);
    }

    #[test]
    fn elapsed_is_derived_not_accumulated() {
        let mut state = TimerState::new();
        state.begin_running(at(0));

        // No sync calls in between: one late read still lands exactly.
        assert_eq!(state.current_elapsed_secs(at(59)), 59);

        state.sync_elapsed_from_anchor(at(59));
        assert_eq!(state.elapsed_secs, 59);
    }

    #[test]
    fn clock_going_backwards_clamps_at_zero() {
        let mut state = TimerState::new();
        state.begin_running(at(30));
        assert_eq!(state.current_elapsed_secs(at(20)), 0);
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut state = TimerState::new();
        state.begin_running(at(0));
        state.clear();
        assert_eq!(state, TimerState::default());
    }
}
