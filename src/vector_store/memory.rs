//! In-memory index store.
//!
//! Useful for testing and throwaway sessions.

use super::{IndexStore, VectorIndex};
use crate::error::{RagChatError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::RwLock;

/// Index store that keeps the saved index in process memory.
#[derive(Default)]
pub struct MemoryIndexStore {
    saved: RwLock<Option<VectorIndex>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn exists(&self) -> Result<bool> {
        let saved = self
            .saved
            .read()
            .map_err(|e| RagChatError::IndexCorrupt(format!("Failed to acquire lock: {}", e)))?;
        Ok(saved.is_some())
    }

    async fn load(&self) -> Result<VectorIndex> {
        let saved = self
            .saved
            .read()
            .map_err(|e| RagChatError::IndexCorrupt(format!("Failed to acquire lock: {}", e)))?;
        saved.clone().ok_or_else(|| RagChatError::IndexMissing {
            path: PathBuf::from(self.location()),
        })
    }

    async fn save(&self, index: &VectorIndex) -> Result<()> {
        let mut saved = self
            .saved
            .write()
            .map_err(|e| RagChatError::IndexCorrupt(format!("Failed to acquire lock: {}", e)))?;
        *saved = Some(index.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory://index".to_string()
    }
}
