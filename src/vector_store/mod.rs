//! Vector index for ragchat.
//!
//! [`VectorIndex`] is the in-memory flat index; [`IndexStore`] abstracts where
//! it is persisted so the orchestrator can be given a disk-backed store in
//! production and an in-memory one in tests.

mod disk;
mod index;
mod memory;

pub use disk::{DiskIndexStore, INDEX_FILE, METADATA_FILE};
pub use index::{IndexEntry, IndexManifest, SearchHit, VectorIndex};
pub use memory::MemoryIndexStore;

use crate::error::Result;
use async_trait::async_trait;

/// Durable home of a [`VectorIndex`].
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Whether a complete index has been saved.
    async fn exists(&self) -> Result<bool>;

    /// Load the saved index; `IndexMissing` when nothing has been saved yet.
    async fn load(&self) -> Result<VectorIndex>;

    /// Persist the full index state, replacing any previous one.
    async fn save(&self, index: &VectorIndex) -> Result<()>;

    /// Human-readable location for messages.
    fn location(&self) -> String;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
