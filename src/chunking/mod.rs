//! Document loading and chunking for indexing.
//!
//! Documents are split into overlapping character windows, preferring paragraph,
//! line, sentence and word boundaries before falling back to raw character cuts.

mod loader;
mod recursive;

pub use loader::{load_documents, LoadFailure, LoadOutcome};
pub use recursive::RecursiveChunker;

use crate::config::ChunkingSettings;
use crate::error::{RagChatError, Result};
use serde::{Deserialize, Serialize};

/// A loaded document, before chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Raw text content.
    pub text: String,
    /// Where the text came from, if it came from a file.
    pub source: Option<String>,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>, source: Option<String>) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

/// A bounded text window extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Source path of the document this chunk was cut from.
    pub source: Option<String>,
    /// Order of this chunk within its document.
    pub index: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: Option<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            source,
            index,
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk to the start of the next.
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagChatError::InvalidInput("chunk size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagChatError::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}
