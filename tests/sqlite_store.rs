use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use focuslink::db::{Database, FocusSession};
use focuslink::sync::{ChannelOptions, SharedStateChannel, SqliteSharedStore};

fn session(tag: &str, start: &str, minutes: i64) -> FocusSession {
    let started_at: DateTime<Utc> = start.parse().unwrap();
    FocusSession::new(
        tag.to_string(),
        started_at,
        started_at + ChronoDuration::minutes(minutes),
    )
}

#[tokio::test]
async fn sessions_round_trip_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("test.sqlite3")).unwrap();

    let first = session("Work", "2025-06-01T09:00:00Z", 30);
    let second = session("Study", "2025-06-02T10:00:00Z", 45);
    db.insert_focus_session(&second).await.unwrap();
    db.insert_focus_session(&first).await.unwrap();

    let all = db.list_focus_sessions().await.unwrap();
    assert_eq!(all.len(), 2);
    // Listed in ascending start order regardless of insert order.
    assert_eq!(all[0], first);
    assert_eq!(all[1], second);

    let day_one = db
        .list_focus_sessions_between(
            "2025-06-01T00:00:00Z".parse().unwrap(),
            "2025-06-02T00:00:00Z".parse().unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(day_one.len(), 1);
    assert_eq!(day_one[0].tag, "Work");
}

#[tokio::test]
async fn shared_state_round_trips_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("test.sqlite3")).unwrap();

    assert_eq!(db.get_shared_state("timer-state").await.unwrap(), None);

    db.set_shared_state("timer-state", "{\"running\":true}")
        .await
        .unwrap();
    db.set_shared_state("timer-state", "{\"running\":false}")
        .await
        .unwrap();

    assert_eq!(
        db.get_shared_state("timer-state").await.unwrap().as_deref(),
        Some("{\"running\":false}")
    );
}

#[tokio::test]
async fn channels_converge_over_the_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("test.sqlite3")).unwrap();
    let store = Arc::new(SqliteSharedStore::new(db));

    let options = ChannelOptions {
        poll_interval: Duration::from_millis(50),
        push_enabled: false,
    };
    let a: SharedStateChannel<u32> =
        SharedStateChannel::open(store.clone(), "counter", 0, options.clone());
    let b: SharedStateChannel<u32> = SharedStateChannel::open(store, "counter", 0, options);

    a.write(7).await;

    let mut converged = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if b.last_known() == 7 {
            converged = true;
            break;
        }
    }
    assert!(converged);
}

#[tokio::test]
async fn newer_database_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.sqlite3");

    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", 99).unwrap();
    }

    assert!(Database::new(path).is_err());
}

#[tokio::test]
async fn database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.sqlite3");

    {
        let db = Database::new(path.clone()).unwrap();
        db.insert_focus_session(&session("Work", "2025-06-01T09:00:00Z", 10))
            .await
            .unwrap();
    }

    let db = Database::new(path).unwrap();
    let all = db.list_focus_sessions().await.unwrap();
    assert_eq!(all.len(), 1);
}
