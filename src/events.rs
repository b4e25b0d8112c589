use tokio::sync::broadcast;

use crate::db::models::FocusSession;
use crate::timer::TimerState;

/// Notifications the core emits toward whatever UI is attached. Nothing here
/// is fatal; emission with no subscribers is not an error.
#[derive(Debug, Clone)]
pub enum AppEvent {
    TimerStateChanged(TimerState),
    SessionCompleted(FocusSession),
    PersistenceFailed(String),
    SurfaceOpened,
    SurfaceClosed,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
