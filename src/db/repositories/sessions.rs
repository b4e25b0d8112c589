use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::error;
use rusqlite::{params, Row};

use crate::db::{connection::Database, helpers::parse_datetime, models::FocusSession};
use crate::events::{AppEvent, EventBus};
use crate::timer::SessionSink;

fn row_to_session(row: &Row) -> Result<FocusSession> {
    let started_at: String = row.get("started_at")?;
    let ended_at: String = row.get("ended_at")?;

    Ok(FocusSession {
        id: row.get("id")?,
        tag: row.get("tag")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_datetime(&ended_at, "ended_at")?,
    })
}

impl Database {
    pub async fn insert_focus_session(&self, session: &FocusSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO focus_sessions (id, tag, started_at, ended_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.tag,
                    record.started_at.to_rfc3339(),
                    record.ended_at.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("failed to insert focus session")?;
            Ok(())
        })
        .await
    }

    pub async fn list_focus_sessions(&self) -> Result<Vec<FocusSession>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tag, started_at, ended_at
                 FROM focus_sessions
                 ORDER BY started_at ASC",
            )?;
            let rows = stmt.query_map([], |row| Ok(row_to_session(row)))?;

            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row??);
            }
            Ok(sessions)
        })
        .await
    }

    pub async fn list_focus_sessions_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<FocusSession>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tag, started_at, ended_at
                 FROM focus_sessions
                 WHERE started_at >= ?1 AND started_at < ?2
                 ORDER BY started_at ASC",
            )?;
            let rows = stmt.query_map(params![from.to_rfc3339(), to.to_rfc3339()], |row| {
                Ok(row_to_session(row))
            })?;

            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row??);
            }
            Ok(sessions)
        })
        .await
    }
}

/// Persistence collaborator backing the timer engine. Writes go through the
/// fire-and-forget queue so a reset never blocks on disk; a failed insert is
/// logged and surfaced as a non-fatal [`AppEvent::PersistenceFailed`].
#[derive(Clone)]
pub struct SqliteSessionSink {
    db: Database,
    events: EventBus,
}

impl SqliteSessionSink {
    pub fn new(db: Database, events: EventBus) -> Self {
        Self { db, events }
    }
}

#[async_trait]
impl SessionSink for SqliteSessionSink {
    async fn create_focus_session(&self, session: FocusSession) -> Result<()> {
        let events = self.events.clone();
        self.db.submit(move |conn| {
            let result = conn.execute(
                "INSERT INTO focus_sessions (id, tag, started_at, ended_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    session.id,
                    session.tag,
                    session.started_at.to_rfc3339(),
                    session.ended_at.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                ],
            );
            if let Err(err) = result {
                error!("Failed to persist focus session {}: {err}", session.id);
                events.emit(AppEvent::PersistenceFailed(err.to_string()));
            }
        })
    }
}
