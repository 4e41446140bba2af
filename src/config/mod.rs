//! Configuration module for ragchat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChatLogProvider, ChatLogSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings,
    IndexSettings, PromptSettings, ProviderSettings, RagSettings, Settings, API_BASE_ENV,
    API_KEY_ENV, CHAT_LOG_PATH_ENV, INDEX_DIR_ENV,
};
