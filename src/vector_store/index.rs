//! Flat in-memory vector index with exact cosine search.

use super::cosine_similarity;
use crate::chunking::Chunk;
use crate::error::{RagChatError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Provider metadata recorded alongside the vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// On-disk format version.
    pub version: u32,
    /// Embedding model every vector was produced with.
    pub model: String,
    /// Length of every vector.
    pub dimensions: usize,
    /// When the index was first built.
    pub created_at: DateTime<Utc>,
    /// When entries were last added.
    pub updated_at: DateTime<Utc>,
}

/// One indexed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Chunk text.
    pub text: String,
    /// Source document path.
    pub source: Option<String>,
    /// Order of the chunk within its document.
    pub chunk_index: usize,
    /// When this entry was added.
    pub indexed_at: DateTime<Utc>,
    /// Embedding vector. Persisted separately from the metadata.
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A search result with score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub text: String,
    pub source: Option<String>,
    pub chunk_index: usize,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Mapping from chunk identity to (vector, text, source).
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index for the given model.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        let now = Utc::now();
        Self {
            manifest: IndexManifest {
                version: FORMAT_VERSION,
                model: model.into(),
                dimensions,
                created_at: now,
                updated_at: now,
            },
            entries: Vec::new(),
        }
    }

    /// Build a new index from chunks and their embeddings.
    pub fn build(model: impl Into<String>, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        let dimensions = embeddings
            .first()
            .map(Vec::len)
            .ok_or_else(|| RagChatError::InvalidInput("cannot build an index from zero chunks".to_string()))?;

        let mut index = Self::new(model, dimensions);
        index.add(chunks, embeddings)?;
        Ok(index)
    }

    /// Reassemble an index from persisted parts.
    pub(crate) fn from_parts(manifest: IndexManifest, entries: Vec<IndexEntry>) -> Self {
        Self { manifest, entries }
    }

    /// Append entries without touching existing ones.
    ///
    /// Either every chunk is added or none is. Identical content added twice
    /// yields two entries.
    pub fn add(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(RagChatError::InvalidInput(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if self.manifest.dimensions == 0 {
            return Err(RagChatError::InvalidInput("embedding dimensions must be greater than 0".to_string()));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.manifest.dimensions) {
            return Err(RagChatError::DimensionMismatch {
                expected: self.manifest.dimensions,
                actual: bad.len(),
            });
        }

        let now = Utc::now();
        let added = chunks.len();
        self.entries.extend(chunks.into_iter().zip(embeddings).map(|(chunk, embedding)| IndexEntry {
            id: Uuid::new_v4(),
            text: chunk.text,
            source: chunk.source,
            chunk_index: chunk.index,
            indexed_at: now,
            embedding,
        }));
        if added > 0 {
            self.manifest.updated_at = now;
        }
        Ok(added)
    }

    /// Return up to `k` entries, most similar first. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.manifest.dimensions {
            return Err(RagChatError::DimensionMismatch {
                expected: self.manifest.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();

        // Stable sort by score descending
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let entry = &self.entries[i];
                SearchHit {
                    id: entry.id,
                    text: entry.text.clone(),
                    source: entry.source.clone(),
                    chunk_index: entry.chunk_index,
                    score,
                }
            })
            .collect())
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn model(&self) -> &str {
        &self.manifest.model
    }

    pub fn dimensions(&self) -> usize {
        self.manifest.dimensions
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chunk counts per source, sorted by source.
    pub fn sources(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &self.entries {
            let source = entry.source.clone().unwrap_or_else(|| "(inline)".to_string());
            *counts.entry(source).or_default() += 1;
        }
        counts.into_iter().collect()
    }

    /// Fail unless vectors in this index are comparable with `model`'s.
    pub fn ensure_model(&self, model: &str) -> Result<()> {
        if self.manifest.model != model {
            return Err(RagChatError::EmbeddingModelMismatch {
                index_model: self.manifest.model.clone(),
                configured_model: model.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk::new(text, Some("doc.txt".to_string()), 0)
    }

    fn texts(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.text.as_str()).collect()
    }

    fn sample() -> VectorIndex {
        VectorIndex::build(
            "test-model",
            vec![chunk("north"), chunk("east"), chunk("north-east")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        )
        .unwrap()
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = sample();
        let hits = index.search(&[1.0, 0.1], 3).unwrap();

        assert_eq!(texts(&hits), vec!["north", "north-east", "east"]);
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_overflowing_scores_do_not_break_ordering() {
        let index = VectorIndex::build(
            "test-model",
            vec![chunk("north"), chunk("huge"), chunk("east")],
            vec![vec![1.0, 0.0], vec![f32::MAX, f32::MAX], vec![0.0, 1.0]],
        )
        .unwrap();

        // The huge entry scores NaN against this query.
        let hits = index.search(&[f32::MAX, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 3);
        let north = hits.iter().position(|h| h.text == "north").unwrap();
        let east = hits.iter().position(|h| h.text == "east").unwrap();
        assert!(north < east);
    }

    #[test]
    fn test_k_larger_than_index_returns_everything() {
        let index = sample();
        assert_eq!(index.search(&[0.0, 1.0], 50).unwrap().len(), 3);
        assert!(index.search(&[0.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_build_rejects_count_mismatch() {
        let result = VectorIndex::build("m", vec![chunk("a"), chunk("b")], vec![vec![1.0]]);
        assert!(matches!(result, Err(RagChatError::InvalidInput(_))));
    }

    #[test]
    fn test_build_rejects_ragged_vectors() {
        let result = VectorIndex::build("m", vec![chunk("a"), chunk("b")], vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(matches!(
            result,
            Err(RagChatError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_build_rejects_empty_input() {
        assert!(VectorIndex::build("m", vec![], vec![]).is_err());
    }

    #[test]
    fn test_add_keeps_existing_entries() {
        let mut index = sample();
        let before: Vec<Uuid> = index.entries().iter().map(|e| e.id).collect();

        index.add(vec![chunk("south")], vec![vec![0.0, -1.0]]).unwrap();

        assert_eq!(index.len(), 4);
        let after: Vec<Uuid> = index.entries()[..3].iter().map(|e| e.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_failed_add_changes_nothing() {
        let mut index = sample();
        let result = index.add(vec![chunk("ok"), chunk("bad")], vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]);

        assert!(result.is_err());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_incremental_add_matches_full_build() {
        let a_chunks = vec![chunk("a1"), chunk("a2")];
        let a_vecs = vec![vec![0.9, 0.1, 0.0], vec![0.1, 0.9, 0.0]];
        let b_chunks = vec![chunk("b1"), chunk("b2"), chunk("a1")];
        let b_vecs = vec![vec![0.0, 0.2, 0.8], vec![0.5, 0.5, 0.0], vec![0.9, 0.1, 0.0]];

        let mut incremental = VectorIndex::build("m", a_chunks.clone(), a_vecs.clone()).unwrap();
        incremental.add(b_chunks.clone(), b_vecs.clone()).unwrap();

        let all_chunks: Vec<Chunk> = a_chunks.into_iter().chain(b_chunks).collect();
        let all_vecs: Vec<Vec<f32>> = a_vecs.into_iter().chain(b_vecs).collect();
        let full = VectorIndex::build("m", all_chunks, all_vecs).unwrap();

        for query in [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.3, 0.3, 0.3]] {
            let a = incremental.search(&query, 10).unwrap();
            let b = full.search(&query, 10).unwrap();
            assert_eq!(texts(&a), texts(&b));
        }
    }

    #[test]
    fn test_duplicate_content_is_tolerated() {
        let mut index = sample();
        index.add(vec![chunk("north")], vec![vec![1.0, 0.0]]).unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(texts(&hits), vec!["north", "north"]);
        assert_ne!(hits[0].id, hits[1].id);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = sample();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(RagChatError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_model_guard() {
        let index = sample();
        assert!(index.ensure_model("test-model").is_ok());
        assert!(matches!(
            index.ensure_model("other-model"),
            Err(RagChatError::EmbeddingModelMismatch { .. })
        ));
    }

    #[test]
    fn test_sources_counts() {
        let mut index = sample();
        index
            .add(vec![Chunk::new("x", None, 0)], vec![vec![1.0, 1.0]])
            .unwrap();
        assert_eq!(
            index.sources(),
            vec![("(inline)".to_string(), 1), ("doc.txt".to_string(), 3)]
        );
    }
}
