use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed focus session. Created only when the timer resets out of a
/// non-trivial run (`elapsed > 0` with a non-empty tag); immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: String,
    pub tag: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl FocusSession {
    pub fn new(tag: String, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        debug_assert!(ended_at >= started_at);
        Self {
            id: Uuid::new_v4().to_string(),
            tag,
            started_at,
            ended_at,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds()
    }
}
