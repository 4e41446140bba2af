//! Process-local chat log.

use super::{ChatLog, ChatTurn};
use crate::error::{RagChatError, Result};
use crate::session::SessionContext;
use async_trait::async_trait;
use std::sync::Mutex;

/// Chat log kept in memory; lost when the process exits.
#[derive(Default)]
pub struct MemoryChatLog {
    turns: Mutex<Vec<ChatTurn>>,
}

impl MemoryChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<ChatTurn>>> {
        self.turns
            .lock()
            .map_err(|e| RagChatError::Storage(format!("Failed to acquire lock: {}", e)))
    }
}

fn belongs_to(turn: &ChatTurn, session: &SessionContext) -> bool {
    turn.user_id == session.user_id && turn.session_id == session.session_id
}

#[async_trait]
impl ChatLog for MemoryChatLog {
    async fn insert(&self, turn: &ChatTurn) -> Result<()> {
        self.lock()?.push(turn.clone());
        Ok(())
    }

    async fn recent(&self, session: &SessionContext, limit: usize) -> Result<Vec<ChatTurn>> {
        let turns = self.lock()?;
        let mut matching: Vec<(usize, &ChatTurn)> = turns
            .iter()
            .enumerate()
            .filter(|(_, t)| belongs_to(t, session))
            .collect();

        matching.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp).then(b.0.cmp(&a.0)));

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|(_, t)| t.clone())
            .collect())
    }

    async fn delete_session(&self, session: &SessionContext) -> Result<usize> {
        let mut turns = self.lock()?;
        let before = turns.len();
        turns.retain(|t| !belongs_to(t, session));
        Ok(before - turns.len())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recent_limit_and_order() {
        let log = MemoryChatLog::new();
        let session = SessionContext::from_ids("u", "s");
        let other = SessionContext::from_ids("u", "other");

        log.insert(&ChatTurn::new(&session, "1", "a")).await.unwrap();
        log.insert(&ChatTurn::new(&other, "x", "y")).await.unwrap();
        log.insert(&ChatTurn::new(&session, "2", "b")).await.unwrap();

        let recent = log.recent(&session, 5).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "2");
        assert_eq!(log.recent(&session, 0).await.unwrap().len(), 0);
    }
}
