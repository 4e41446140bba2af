//! Configuration settings for ragchat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the provider base URL.
pub const API_BASE_ENV: &str = "OPENAI_API_BASE";
/// Environment variable overriding the vector index directory.
pub const INDEX_DIR_ENV: &str = "RAGCHAT_INDEX_DIR";
/// Environment variable overriding the chat log database path.
pub const CHAT_LOG_PATH_ENV: &str = "RAGCHAT_CHAT_LOG_PATH";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub provider: ProviderSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub index: IndexSettings,
    pub rag: RagSettings,
    pub chat_log: ChatLogSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.ragchat".to_string(),
        }
    }
}

/// Connection settings for the OpenAI-compatible provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API key. Falls back to `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Alternative base URL for OpenAI-compatible servers.
    pub api_base: Option<String>,
    /// Timeout applied to every embedding and generation request.
    pub request_timeout_secs: u64,
    /// Retries for timed-out or dropped requests.
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            request_timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use. Must not change between ingestion and querying.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Document chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Directory holding the persisted index.
    pub dir: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            dir: "vectorstore".to_string(),
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    /// Sampling temperature for generation.
    pub temperature: f32,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Number of previous turns included in the prompt.
    pub history_turns: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            top_k: 4,
            history_turns: 5,
        }
    }
}

/// Chat log backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatLogProvider {
    /// Durable SQLite file (default).
    #[default]
    Sqlite,
    /// Process-local, lost on exit.
    Memory,
}

impl std::fmt::Display for ChatLogProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatLogProvider::Sqlite => write!(f, "sqlite"),
            ChatLogProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Chat history store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatLogSettings {
    /// Backend (sqlite, memory).
    pub provider: ChatLogProvider,
    /// Path to the SQLite database (for the sqlite provider).
    pub sqlite_path: String,
}

impl Default for ChatLogSettings {
    fn default() -> Self {
        Self {
            provider: ChatLogProvider::Sqlite,
            sqlite_path: "~/.ragchat/chat_history.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = non_empty(API_BASE_ENV) {
            self.provider.api_base = Some(base);
        }
        if let Some(dir) = non_empty(INDEX_DIR_ENV) {
            self.index.dir = dir;
        }
        if let Some(path) = non_empty(CHAT_LOG_PATH_ENV) {
            self.chat_log.sqlite_path = path;
        }
    }

    /// Reject settings that would make the pipeline misbehave.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::RagChatError;

        if self.chunking.chunk_size == 0 {
            return Err(RagChatError::Config("chunking.chunk_size must be greater than 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(RagChatError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(RagChatError::Config("rag.top_k must be at least 1".to_string()));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(RagChatError::Config("embedding.model must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve the API key from settings or the environment.
    pub fn api_key(&self) -> crate::error::Result<String> {
        self.provider
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                crate::error::RagChatError::Config(format!(
                    "{} not set. Set it with: export {}='sk-...'",
                    API_KEY_ENV, API_KEY_ENV
                ))
            })
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::RagChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ragchat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded vector index directory.
    pub fn index_dir(&self) -> PathBuf {
        Self::expand_path(&self.index.dir)
    }

    /// Get the expanded chat log database path.
    pub fn chat_log_path(&self) -> PathBuf {
        Self::expand_path(&self.chat_log.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.rag.top_k, 4);
        assert_eq!(settings.rag.history_turns, 5);
        assert_eq!(settings.index.dir, "vectorstore");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [rag]
            top_k = 8

            [chat_log]
            provider = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(settings.rag.top_k, 8);
        assert_eq!(settings.rag.history_turns, 5);
        assert_eq!(settings.chat_log.provider, ChatLogProvider::Memory);
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (INDEX_DIR_ENV, "/srv/index"),
            (CHAT_LOG_PATH_ENV, "/srv/chat.db"),
            (API_BASE_ENV, ""),
        ]);

        let mut settings = Settings::default();
        settings.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.index.dir, "/srv/index");
        assert_eq!(settings.chat_log.sqlite_path, "/srv/chat.db");
        assert!(settings.provider.api_base.is_none());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut settings = Settings::default();
        settings.chunking.chunk_overlap = settings.chunking.chunk_size;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_configured_api_key_wins() {
        let mut settings = Settings::default();
        settings.provider.api_key = Some("sk-test".to_string());
        assert_eq!(settings.api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.rag.model = "gpt-4.1".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.rag.model, "gpt-4.1");
    }
}
