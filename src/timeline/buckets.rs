use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::db::models::FocusSession;

/// Per-day rollup for report views. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub total_secs: i64,
    pub session_count: usize,
}

/// Group sessions by the calendar date their `started_at` falls on in `tz`.
/// A session counts wholly toward its start date, even when it crosses
/// midnight. Buckets come back in date order.
pub fn day_buckets_in<Tz: TimeZone>(sessions: &[FocusSession], tz: &Tz) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, (i64, usize)> = BTreeMap::new();

    for session in sessions {
        let date = session.started_at.with_timezone(tz).date_naive();
        let entry = days.entry(date).or_insert((0, 0));
        entry.0 += session.duration_secs();
        entry.1 += 1;
    }

    days.into_iter()
        .map(|(date, (total_secs, session_count))| DayBucket {
            date,
            total_secs,
            session_count,
        })
        .collect()
}

pub fn day_buckets_local(sessions: &[FocusSession]) -> Vec<DayBucket> {
    day_buckets_in(sessions, &Local)
}
