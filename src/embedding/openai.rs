//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::Settings;
use crate::error::{RagChatError, Result};
use crate::openai::{create_client, provider_error, RetryPolicy};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI has a limit on inputs per request.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl OpenAIEmbedder {
    /// Create an embedder from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.embedding.model.clone(),
            dimensions: settings.embedding.dimensions as usize,
            retry: RetryPolicy::new(settings.provider.max_retries),
        })
    }

    /// Create an embedder with an existing client and custom model and dimensions.
    pub fn with_client(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        dimensions: usize,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
            retry: RetryPolicy::default(),
        }
    }

    async fn embed_request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(input))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| RagChatError::provider("Embedding", format!("Failed to build request: {}", e), false))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| provider_error("Embedding", e))?;

        let mut data = response.data;
        if data.len() != expected {
            return Err(RagChatError::provider(
                "Embedding",
                format!("expected {} embeddings, received {}", expected, data.len()),
                false,
            ));
        }

        // Sort by index to ensure correct order
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagChatError::provider("Embedding", "empty embedding response", false))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let batch = self
                .retry
                .run("embedding request", || self.embed_request(chunk.to_vec()))
                .await?;
            all_embeddings.extend(batch);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
