//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and the index are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{RagChatError, Result};
use crate::vector_store::VectorIndex;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion requires an API key for embeddings.
    Ingest,
    /// Asking and searching require an API key and an index.
    Query,
    /// The server requires an API key; the index may be built through it.
    Serve,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    settings.api_key()?;

    if let Operation::Query = operation {
        let dir = settings.index_dir();
        if !VectorIndex::exists(&dir) {
            return Err(RagChatError::IndexMissing { path: dir });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.provider.api_key = Some("sk-test".to_string());
        settings.index.dir = dir.join("vectorstore").display().to_string();
        settings
    }

    #[test]
    fn test_query_requires_index() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());

        assert!(check(Operation::Ingest, &settings).is_ok());
        assert!(check(Operation::Serve, &settings).is_ok());
        assert!(check(Operation::Query, &settings).unwrap_err().is_index_missing());
    }

    #[test]
    fn test_query_passes_with_index() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());

        VectorIndex::build(
            "m",
            vec![crate::chunking::Chunk::new("text", None, 0)],
            vec![vec![1.0, 0.0]],
        )
        .unwrap()
        .save(&settings.index_dir())
        .unwrap();

        assert!(check(Operation::Query, &settings).is_ok());
    }
}
