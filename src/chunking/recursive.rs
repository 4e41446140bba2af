//! Recursive character chunking.
//!
//! Text is split on the coarsest separator present, pieces that still exceed the
//! chunk size are split again with the next separator, and the resulting pieces
//! are merged back into windows of at most `chunk_size` characters with up to
//! `chunk_overlap` characters repeated between neighbours.

use super::{Chunk, ChunkingConfig, SourceDocument};
use std::collections::VecDeque;
use tracing::debug;

/// Paragraph, line, sentence, word, character.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Deterministic recursive character chunker.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split every document, keeping document order.
    pub fn chunk_documents(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| self.chunk_document(doc))
            .collect();
        debug!("Split {} documents into {} chunks", documents.len(), chunks.len());
        chunks
    }

    /// Split one document into chunks tagged with its source.
    pub fn chunk_document(&self, document: &SourceDocument) -> Vec<Chunk> {
        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(text, document.source.clone(), i))
            .collect()
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_keep_separator(text, separator) {
            if char_len(piece) <= self.config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }

            if finer.is_empty() {
                push_trimmed(&mut chunks, piece);
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    /// Merge small pieces into windows, carrying the tail of each window into the next.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > size && !window.is_empty() {
                push_trimmed(&mut merged, &window.iter().copied().collect::<String>());

                while total > overlap || (total > 0 && total + len > size) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        if !window.is_empty() {
            push_trimmed(&mut merged, &window.iter().copied().collect::<String>());
        }

        merged
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

/// Split on `separator`, leaving it attached to the end of each piece.
/// An empty separator splits into single characters.
fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split_inclusive(separator).collect()
    }
}

fn push_trimmed(out: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(ChunkingConfig::new(size, overlap).unwrap())
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{} ", i)).collect::<String>()
    }

    /// Longest suffix of `a` that is also a prefix of `b`, in characters.
    fn shared_boundary(a: &str, b: &str) -> usize {
        let a_chars: Vec<char> = a.chars().collect();
        let b_chars: Vec<char> = b.chars().collect();
        (1..=a_chars.len().min(b_chars.len()))
            .rev()
            .find(|&n| a_chars[a_chars.len() - n..] == b_chars[..n])
            .unwrap_or(0)
    }

    #[test]
    fn test_small_document_is_one_chunk() {
        let doc = SourceDocument::new("The sky is blue. Grass is green.", Some("facts.txt".to_string()));
        let chunks = RecursiveChunker::default().chunk_document(&doc);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "The sky is blue. Grass is green.");
        assert_eq!(chunks[0].source.as_deref(), Some("facts.txt"));
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_empty_text() {
        assert!(RecursiveChunker::default().split_text("").is_empty());
        assert!(RecursiveChunker::default().split_text("  \n\n  ").is_empty());
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = format!("{}\n\n{}\n{}", words(120), words(40), words(300));
        let chunker = chunker(200, 50);
        assert_eq!(chunker.split_text(&text), chunker.split_text(&text));
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = format!("{}\n\n{}", words(400), words(150));
        let chunker = chunker(120, 30);
        let chunks = chunker.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 120, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let overlap = 30;
        let chunks = chunker(100, overlap).split_text(&words(200));
        assert!(chunks.len() > 2);

        // Snapping to word boundaries may shave off up to one word.
        let tolerance = "word199 ".len() + 1;
        for pair in chunks.windows(2) {
            let shared = shared_boundary(&pair[0], &pair[1]);
            assert!(shared > 0, "no overlap between {:?} and {:?}", pair[0], pair[1]);
            assert!(shared + tolerance >= overlap, "overlap {} too small", shared);
            assert!(shared <= overlap);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let first = "Rust is a systems programming language focused on safety.";
        let second = "Cargo is the Rust package manager and build tool.";
        let text = format!("{}\n\n{}", first, second);

        let chunks = chunker(80, 10).split_text(&text);
        assert_eq!(chunks, vec![first.to_string(), second.to_string()]);
    }

    #[test]
    fn test_falls_back_to_characters() {
        let text = "x".repeat(250);
        let chunks = chunker(100, 10).split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= 100));
        assert_eq!(chunks[0].len(), 100);
    }

    #[test]
    fn test_multibyte_text_is_not_split_mid_character() {
        let text = "é".repeat(50);
        let chunks = chunker(20, 5).split_text(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 20 && c.chars().all(|ch| ch == 'é')));
    }

    #[test]
    fn test_chunk_indices_restart_per_document() {
        let docs = vec![
            SourceDocument::new(words(60), Some("a.txt".to_string())),
            SourceDocument::new(words(60), Some("b.txt".to_string())),
        ];
        let chunks = chunker(150, 20).chunk_documents(&docs);

        let first_b = chunks.iter().position(|c| c.source.as_deref() == Some("b.txt")).unwrap();
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[first_b].index, 0);
        assert!(chunks[..first_b].iter().all(|c| c.source.as_deref() == Some("a.txt")));
    }
}
