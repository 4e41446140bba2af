//! Retrieval-augmented generation.
//!
//! Builds the answer prompt from retrieved chunks and chat history and hands it
//! to a [`Generator`].

mod generator;
mod prompt;

pub use generator::{Generator, OpenAIGenerator};
pub use prompt::{format_context, PromptBuilder};

use crate::vector_store::SearchHit;
use serde::Serialize;

/// A generated answer plus the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SearchHit>,
}

impl RagAnswer {
    /// Distinct source paths, in retrieval order.
    pub fn source_paths(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for source in self.sources.iter().filter_map(|h| h.source.as_deref()) {
            if !seen.contains(&source) {
                seen.push(source);
            }
        }
        seen
    }
}
