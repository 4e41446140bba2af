//! Deterministic stand-ins for the provider traits.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::rag::Generator;
use async_trait::async_trait;
use std::sync::Mutex;

/// Bag-of-words embedder: each lowercase word is hashed into one of `dimensions` buckets.
pub struct HashEmbedder {
    model: String,
    dimensions: usize,
    yield_on_batch: bool,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self::named("hash-embedder")
    }

    pub fn named(model: &str) -> Self {
        Self {
            model: model.to_string(),
            dimensions: 64,
            yield_on_batch: false,
        }
    }

    /// Yields to the scheduler once per batch, letting concurrent callers interleave.
    pub fn yielding() -> Self {
        Self {
            yield_on_batch: true,
            ..Self::new()
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) as usize % self.dimensions;
            vector[bucket] += 1.0;
        }
        vector
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf29ce484222325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.yield_on_batch {
            tokio::task::yield_now().await;
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Answers by quoting the documents section of the prompt. Keeps every prompt it saw.
#[derive(Default)]
pub struct EchoGenerator {
    prompts: Mutex<Vec<String>>,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let documents = prompt
            .split("Relevant Documents:")
            .nth(1)
            .and_then(|rest| rest.split("New Question:").next())
            .unwrap_or("")
            .trim();
        Ok(format!("According to the documents: {}", documents))
    }

    fn model(&self) -> &str {
        "echo"
    }
}
