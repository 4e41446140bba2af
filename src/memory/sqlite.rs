//! SQLite-backed chat log.

use super::{ChatLog, ChatTurn};
use crate::error::{RagChatError, Result};
use crate::session::SessionContext;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chat_turns (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        user_id TEXT NOT NULL,
        session_id TEXT NOT NULL,
        query TEXT NOT NULL,
        response TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chat_turns_session
        ON chat_turns(user_id, session_id, timestamp);
"#;

/// Chat log stored in a single SQLite file.
pub struct SqliteChatLog {
    conn: Mutex<Connection>,
    location: String,
}

impl SqliteChatLog {
    /// Open (or create) the chat log at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened chat log at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            location: path.display().to_string(),
        })
    }

    /// Create an in-memory SQLite chat log (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            location: ":memory:".to_string(),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RagChatError::Storage(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl ChatLog for SqliteChatLog {
    #[instrument(skip(self, turn), fields(id = %turn.id))]
    async fn insert(&self, turn: &ChatTurn) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO chat_turns (id, user_id, session_id, query, response, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                turn.id.to_string(),
                turn.user_id,
                turn.session_id,
                turn.query,
                turn.response,
                // Fixed width so text order matches time order
                turn.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;

        debug!("Inserted chat turn {}", turn.id);
        Ok(())
    }

    async fn recent(&self, session: &SessionContext, limit: usize) -> Result<Vec<ChatTurn>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, session_id, query, response, timestamp
            FROM chat_turns
            WHERE user_id = ?1 AND session_id = ?2
            ORDER BY timestamp DESC, seq DESC
            LIMIT ?3
            "#,
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![session.user_id, session.session_id, limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut turns = Vec::new();
        for row in rows {
            let (id, user_id, session_id, query, response, timestamp) = row?;
            turns.push(ChatTurn {
                id: Uuid::parse_str(&id)
                    .map_err(|e| RagChatError::Storage(format!("Invalid turn id '{}': {}", id, e)))?,
                user_id,
                session_id,
                query,
                response,
                timestamp: DateTime::parse_from_rfc3339(&timestamp)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| RagChatError::Storage(format!("Invalid timestamp '{}': {}", timestamp, e)))?,
            });
        }

        Ok(turns)
    }

    #[instrument(skip(self, session), fields(session = %session))]
    async fn delete_session(&self, session: &SessionContext) -> Result<usize> {
        let conn = self.lock()?;

        let removed = conn.execute(
            "DELETE FROM chat_turns WHERE user_id = ?1 AND session_id = ?2",
            params![session.user_id, session.session_id],
        )?;

        debug!("Deleted {} chat turns", removed);
        Ok(removed)
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let log = SqliteChatLog::in_memory().unwrap();
        let session = SessionContext::from_ids("u", "s");

        for q in ["first", "second", "third"] {
            log.insert(&ChatTurn::new(&session, q, "ok")).await.unwrap();
        }

        let recent = log.recent(&session, 2).await.unwrap();
        let queries: Vec<&str> = recent.iter().map(|t| t.query.as_str()).collect();
        assert_eq!(queries, vec!["third", "second"]);
    }

    #[tokio::test]
    async fn test_same_timestamp_keeps_insertion_order() {
        let log = SqliteChatLog::in_memory().unwrap();
        let session = SessionContext::from_ids("u", "s");
        let now = Utc::now();

        for q in ["a", "b"] {
            let mut turn = ChatTurn::new(&session, q, "ok");
            turn.timestamp = now;
            log.insert(&turn).await.unwrap();
        }

        let recent = log.recent(&session, 10).await.unwrap();
        assert_eq!(recent[0].query, "b");
        assert_eq!(recent[1].query, "a");
    }

    #[tokio::test]
    async fn test_delete_session_scope() {
        let log = SqliteChatLog::in_memory().unwrap();
        let keep = SessionContext::from_ids("u1", "s2");
        let gone = SessionContext::from_ids("u1", "s1");

        log.insert(&ChatTurn::new(&gone, "q", "a")).await.unwrap();
        log.insert(&ChatTurn::new(&gone, "q", "a")).await.unwrap();
        log.insert(&ChatTurn::new(&keep, "q", "a")).await.unwrap();

        assert_eq!(log.delete_session(&gone).await.unwrap(), 2);
        assert!(log.recent(&gone, 10).await.unwrap().is_empty());
        assert_eq!(log.recent(&keep, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chat_history.db");
        let session = SessionContext::from_ids("u", "s");

        let turn = ChatTurn::new(&session, "What color is the sky?", "Blue.");
        {
            let log = SqliteChatLog::new(&path).unwrap();
            log.insert(&turn).await.unwrap();
        }

        let reopened = SqliteChatLog::new(&path).unwrap();
        let recent = reopened.recent(&session, 5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, turn.id);
        assert_eq!(recent[0].response, "Blue.");
    }
}
