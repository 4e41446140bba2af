//! Loading text documents from disk.
//!
//! A load failure never aborts ingestion: it is recorded in the outcome and the
//! caller decides how to report it.

use super::SourceDocument;
use crate::error::RagChatError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions picked up when loading a directory.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// A document that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl From<LoadFailure> for RagChatError {
    fn from(failure: LoadFailure) -> Self {
        RagChatError::DocumentLoad {
            path: failure.path,
            reason: failure.reason,
        }
    }
}

/// Result of loading one path.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<SourceDocument>,
    pub failures: Vec<LoadFailure>,
}

impl LoadOutcome {
    fn fail(&mut self, path: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Failed to load {}: {}", path.display(), reason);
        self.failures.push(LoadFailure {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// Load a single UTF-8 text file, or every text file under a directory.
///
/// Directory entries are visited in sorted order so re-indexing is reproducible.
pub fn load_documents(path: &Path) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();

    if !path.exists() {
        outcome.fail(path, "file not found");
        return outcome;
    }

    if path.is_dir() {
        let mut files = Vec::new();
        collect_text_files(path, &mut files, &mut outcome);
        files.sort();
        for file in files {
            load_file(&file, &mut outcome);
        }
    } else {
        load_file(path, &mut outcome);
    }

    debug!(
        "Loaded {} documents from {} ({} failures)",
        outcome.documents.len(),
        path.display(),
        outcome.failures.len()
    );
    outcome
}

fn collect_text_files(dir: &Path, files: &mut Vec<PathBuf>, outcome: &mut LoadOutcome) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            outcome.fail(dir, e.to_string());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_text_files(&path, files, outcome);
        } else if is_text_file(&path) {
            files.push(path);
        }
    }
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_file(path: &Path, outcome: &mut LoadOutcome) {
    match std::fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => outcome.fail(path, "document is empty"),
        Ok(text) => outcome.documents.push(SourceDocument::new(
            text.replace("\r\n", "\n"),
            Some(path.display().to_string()),
        )),
        Err(e) => outcome.fail(path, e.to_string()),
    }
}
