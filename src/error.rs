//! Error types for ragchat.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for ragchat operations.
#[derive(Error, Debug)]
pub enum RagChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No vector index found at {}. Run `ragchat ingest <path>` first.", path.display())]
    IndexMissing { path: PathBuf },

    #[error("Vector index is corrupt: {0}")]
    IndexCorrupt(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(
        "Index was built with embedding model '{index_model}' but the configured model is '{configured_model}'. \
         Re-ingest or switch the model back."
    )]
    EmbeddingModelMismatch {
        index_model: String,
        configured_model: String,
    },

    #[error("{operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
        retryable: bool,
    },

    #[error("Chat log error: {0}")]
    Storage(String),

    #[error("Could not load document {}: {reason}", path.display())]
    DocumentLoad { path: PathBuf, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl RagChatError {
    /// Build a provider error for an embedding or generation call.
    pub fn provider(operation: &'static str, message: impl Into<String>, retryable: bool) -> Self {
        Self::Provider {
            operation,
            message: message.into(),
            retryable,
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { retryable, .. } => *retryable,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Whether this is the "ingestion has not run" condition.
    pub fn is_index_missing(&self) -> bool {
        matches!(self, Self::IndexMissing { .. })
    }
}

/// Result type alias for ragchat operations.
pub type Result<T> = std::result::Result<T, RagChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_missing_is_distinct_from_io() {
        let missing = RagChatError::IndexMissing {
            path: PathBuf::from("vectorstore"),
        };
        assert!(missing.is_index_missing());
        assert!(missing.to_string().contains("ragchat ingest"));

        let io = RagChatError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_index_missing());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(RagChatError::provider("Embedding", "timed out", true).is_retryable());
        assert!(!RagChatError::provider("Generation", "invalid api key", false).is_retryable());
        assert!(!RagChatError::Storage("locked".to_string()).is_retryable());
    }
}
