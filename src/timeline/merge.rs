use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::models::FocusSession;

/// Reference gap threshold used by the calendar views: 30 minutes.
pub const DEFAULT_MERGE_GAP_SECS: i64 = 30 * 60;

/// A contiguous run of same-tag sessions collapsed into one display block.
/// Derived, recomputed per render, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedBlock {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub tag: String,
    pub cluster_id: String,
}

/// Cluster sessions into display blocks.
///
/// Sessions are walked in ascending start order; the next session extends
/// the current cluster when its tag matches and the gap from the cluster's
/// end is at most `gap_threshold_secs`. Boundary policy: a gap exactly equal
/// to the threshold merges, and a negative gap (overlapping sessions) counts
/// as contiguous. Different tags never merge regardless of gap.
pub fn merge_sessions(sessions: &[FocusSession], gap_threshold_secs: i64) -> Vec<MergedBlock> {
    let mut sorted: Vec<&FocusSession> = sessions.iter().collect();
    sorted.sort_by_key(|session| (session.started_at, session.ended_at));

    let mut blocks = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return blocks;
    };

    let mut cluster = MergedBlock {
        started_at: first.started_at,
        ended_at: first.ended_at,
        tag: first.tag.clone(),
        cluster_id: Uuid::new_v4().to_string(),
    };

    for session in iter {
        let gap_secs = (session.started_at - cluster.ended_at).num_seconds();
        if session.tag == cluster.tag && gap_secs <= gap_threshold_secs {
            // A session wholly inside the cluster must not shrink the block.
            cluster.ended_at = cluster.ended_at.max(session.ended_at);
        } else {
            blocks.push(cluster);
            cluster = MergedBlock {
                started_at: session.started_at,
                ended_at: session.ended_at,
                tag: session.tag.clone(),
                cluster_id: Uuid::new_v4().to_string(),
            };
        }
    }

    blocks.push(cluster);
    blocks
}
