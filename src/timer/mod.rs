mod engine;
mod mirror;
mod state;

pub use engine::{SessionSink, TimerEngine};
pub use mirror::TimerMirror;
pub use state::{TimerPhase, TimerState};
