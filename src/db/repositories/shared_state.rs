use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::connection::Database;

impl Database {
    pub async fn get_shared_state(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.query_row(
                "SELECT snapshot FROM shared_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to read shared state")
        })
        .await
    }

    pub async fn set_shared_state(&self, key: &str, snapshot: &str) -> Result<()> {
        let key = key.to_string();
        let snapshot = snapshot.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO shared_state (key, snapshot, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET snapshot = ?2, updated_at = ?3",
                params![key, snapshot, Utc::now().to_rfc3339()],
            )
            .context("failed to write shared state")?;
            Ok(())
        })
        .await
    }
}
