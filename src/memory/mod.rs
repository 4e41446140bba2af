//! Conversational memory.
//!
//! [`ChatLog`] is the durable append/query/delete store; [`ConversationMemory`]
//! sits on top of it and renders recent turns for prompt injection.

mod in_memory;
mod sqlite;

pub use in_memory::MemoryChatLog;
pub use sqlite::SqliteChatLog;

use crate::config::{ChatLogProvider, Settings};
use crate::error::Result;
use crate::session::SessionContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub user_id: String,
    pub session_id: String,
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a turn stamped with the current time.
    pub fn new(session: &SessionContext, query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: session.user_id.clone(),
            session_id: session.session_id.clone(),
            query: query.into(),
            response: response.into(),
            timestamp: Utc::now(),
        }
    }

    /// `User: ...\nAssistant: ...`
    pub fn render(&self) -> String {
        format!("User: {}\nAssistant: {}", self.query, self.response)
    }
}

/// Persisted chat history store.
#[async_trait]
pub trait ChatLog: Send + Sync {
    /// Append a turn. Never overwrites.
    async fn insert(&self, turn: &ChatTurn) -> Result<()>;

    /// Up to `limit` turns of the session, newest first.
    async fn recent(&self, session: &SessionContext, limit: usize) -> Result<Vec<ChatTurn>>;

    /// Delete every turn of the session, returning how many were removed.
    async fn delete_session(&self, session: &SessionContext) -> Result<usize>;

    /// Human-readable location for messages.
    fn location(&self) -> String;
}

/// Create the chat log selected in settings.
pub fn create_chat_log(settings: &Settings) -> Result<Arc<dyn ChatLog>> {
    match settings.chat_log.provider {
        ChatLogProvider::Sqlite => Ok(Arc::new(SqliteChatLog::new(&settings.chat_log_path())?)),
        ChatLogProvider::Memory => Ok(Arc::new(MemoryChatLog::new())),
    }
}

/// Per-session conversation history.
#[derive(Clone)]
pub struct ConversationMemory {
    log: Arc<dyn ChatLog>,
}

impl ConversationMemory {
    pub fn new(log: Arc<dyn ChatLog>) -> Self {
        Self { log }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(create_chat_log(settings)?))
    }

    pub fn location(&self) -> String {
        self.log.location()
    }

    /// The most recent `limit` turns, oldest first.
    pub async fn turns(&self, session: &SessionContext, limit: usize) -> Result<Vec<ChatTurn>> {
        let mut turns = self.log.recent(session, limit).await?;
        turns.reverse();
        Ok(turns)
    }

    /// Recent history rendered for the prompt. Empty when the session has none.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn fetch(&self, session: &SessionContext, limit: usize) -> Result<String> {
        let turns = self.turns(session, limit).await?;
        debug!("Fetched {} history turns", turns.len());
        Ok(turns
            .iter()
            .map(ChatTurn::render)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    /// Record a completed exchange.
    #[instrument(skip(self, session, query, response), fields(session = %session))]
    pub async fn append(
        &self,
        session: &SessionContext,
        query: impl Into<String> + Send,
        response: impl Into<String> + Send,
    ) -> Result<ChatTurn> {
        let turn = ChatTurn::new(session, query, response);
        self.log.insert(&turn).await?;
        Ok(turn)
    }

    /// Forget the session's history. Failures are logged, not returned.
    pub async fn clear(&self, session: &SessionContext) -> Option<usize> {
        match self.log.delete_session(session).await {
            Ok(removed) => {
                debug!("Cleared {} turns for {}", removed, session);
                Some(removed)
            }
            Err(e) => {
                warn!("Failed to clear history for {}: {}", session, e);
                None
            }
        }
    }
}
