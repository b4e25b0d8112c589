use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use log::warn;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::clock::Clock;
use crate::db::models::FocusSession;
use crate::events::{AppEvent, EventBus};
use crate::sync::SharedStateChannel;

use super::mirror::TimerMirror;
use super::state::{TimerPhase, TimerState};

/// Persistence collaborator for completed sessions. Called exactly once per
/// non-trivial reset; failures must never reach the timer state machine.
#[async_trait]
pub trait SessionSink: Send + Sync {
    async fn create_focus_session(&self, session: FocusSession) -> Result<()>;
}

/// The Idle/Running/Paused state machine owning timer ground truth.
///
/// Illegal transitions (`start` while Running, `pause` while Idle or Paused)
/// are silent no-ops rather than errors: the companion surface may deliver
/// redundant control signals and redundancy has to be harmless.
#[derive(Clone)]
pub struct TimerEngine {
    state: Arc<Mutex<TimerState>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn SessionSink>,
    events: EventBus,
    channel: SharedStateChannel<TimerMirror>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    signals: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl TimerEngine {
    pub fn new(
        clock: Arc<dyn Clock>,
        sink: Arc<dyn SessionSink>,
        events: EventBus,
        channel: SharedStateChannel<TimerMirror>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            clock,
            sink,
            events,
            channel,
            ticker: Arc::new(Mutex::new(None)),
            signals: Arc::new(Mutex::new(None)),
            tick_interval,
        }
    }

    pub async fn snapshot(&self) -> TimerState {
        let mut guard = self.state.lock().await;
        guard.sync_elapsed_from_anchor(self.clock.now());
        guard.clone()
    }

    /// Idle/Paused -> Running. Rebases the anchor so elapsed time continues
    /// from the accumulated value, then spawns the tick loop.
    pub async fn start(&self) {
        let snapshot = {
            let mut guard = self.state.lock().await;
            if guard.phase == TimerPhase::Running {
                return;
            }
            guard.begin_running(self.clock.now());
            guard.clone()
        };

        self.spawn_ticker().await;
        self.publish(&snapshot).await;
    }

    /// Running -> Paused. Folds `now - anchor` into `elapsed_secs`, clears
    /// the anchor and cancels the tick loop.
    pub async fn pause(&self) {
        let snapshot = {
            let mut guard = self.state.lock().await;
            if guard.phase != TimerPhase::Running {
                return;
            }
            guard.pause(self.clock.now());
            guard.clone()
        };

        self.cancel_ticker().await;
        self.publish(&snapshot).await;
    }

    /// Any phase -> Idle. Emits one [`FocusSession`] when there is elapsed
    /// time to record and a non-empty tag; otherwise the run is silently
    /// discarded. The state always resets, even when persistence fails.
    pub async fn reset(&self, tag: &str) {
        let now = self.clock.now();
        let (elapsed, snapshot) = {
            let mut guard = self.state.lock().await;
            guard.sync_elapsed_from_anchor(now);
            let elapsed = guard.elapsed_secs;
            guard.clear();
            (elapsed, guard.clone())
        };

        self.cancel_ticker().await;

        let tag = tag.trim();
        if elapsed > 0 && !tag.is_empty() {
            let session = FocusSession::new(
                tag.to_string(),
                now - ChronoDuration::seconds(elapsed as i64),
                now,
            );
            match self.sink.create_focus_session(session.clone()).await {
                Ok(()) => self.events.emit(AppEvent::SessionCompleted(session)),
                Err(err) => {
                    warn!("Failed to persist focus session: {err}");
                    self.events.emit(AppEvent::PersistenceFailed(err.to_string()));
                }
            }
        }

        self.publish(&snapshot).await;
    }

    /// Advisory recomputation while Running: refresh `elapsed_secs` from the
    /// anchor and republish so observers stay current. Never moves the
    /// anchor. Returns false once the phase is no longer Running so the tick
    /// loop can exit on its own.
    pub async fn tick(&self) -> bool {
        let snapshot = {
            let mut guard = self.state.lock().await;
            if guard.phase != TimerPhase::Running {
                return false;
            }
            guard.sync_elapsed_from_anchor(self.clock.now());
            guard.clone()
        };

        self.publish(&snapshot).await;
        true
    }

    /// Start consuming edge-triggered control signals from the channel.
    /// Idempotent; the loop runs until [`shutdown`](Self::shutdown).
    pub async fn watch_control_signals(&self) {
        let mut guard = self.signals.lock().await;
        if guard.is_some() {
            return;
        }

        let engine = self.clone();
        let mut rx = self.channel.subscribe();
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let mirror = rx.borrow_and_update().clone();
                engine.consume_signals(mirror).await;
            }
        });

        *guard = Some(handle);
    }

    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
        if let Some(handle) = self.signals.lock().await.take() {
            handle.abort();
        }
        self.channel.close();
    }

    /// Apply pending companion signals exactly once, then write back the
    /// authoritative state with both counters zeroed.
    ///
    /// Tie-break for a pause and a resume landing in the same observation:
    /// transitions apply in signal-stamp order with the most recent stamp
    /// last, so the most recent request wins the final say. Missing or equal
    /// stamps apply pause before resume, resolving a same-instant burst to
    /// Running.
    async fn consume_signals(&self, mirror: TimerMirror) {
        if !mirror.has_signals() {
            return;
        }

        let pause_last = match (mirror.pause_signaled_at, mirror.resume_signaled_at) {
            (Some(pause_at), Some(resume_at)) => pause_at > resume_at,
            _ => false,
        };

        if pause_last {
            if mirror.resume_requests > 0 {
                self.start().await;
            }
            if mirror.pause_requests > 0 {
                self.pause().await;
            }
        } else {
            if mirror.pause_requests > 0 {
                self.pause().await;
            }
            if mirror.resume_requests > 0 {
                self.start().await;
            }
        }

        let snapshot = self.snapshot().await;
        self.channel
            .write(TimerMirror {
                elapsed_seconds: snapshot.elapsed_secs,
                running: snapshot.phase == TimerPhase::Running,
                ..TimerMirror::default()
            })
            .await;
    }

    async fn spawn_ticker(&self) {
        let mut guard = self.ticker.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let engine = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(engine.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !engine.tick().await {
                    break;
                }
            }
        });

        *guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn publish(&self, snapshot: &TimerState) {
        self.events.emit(AppEvent::TimerStateChanged(snapshot.clone()));

        let elapsed = snapshot.elapsed_secs;
        let running = snapshot.phase == TimerPhase::Running;
        self.channel
            .update(|mirror| {
                mirror.elapsed_seconds = elapsed;
                mirror.running = running;
            })
            .await;
    }
}
