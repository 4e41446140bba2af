//! Text generation.

use crate::config::Settings;
use crate::error::{RagChatError, Result};
use crate::openai::{create_client, provider_error, RetryPolicy};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Trait for completion models.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a completion for a fully rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier.
    fn model(&self) -> &str;
}

/// OpenAI chat-completions generator.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAIGenerator {
    /// Create a generator from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.rag.model.clone(),
            temperature: settings.rag.temperature,
            retry: RetryPolicy::new(settings.provider.max_retries),
        })
    }

    pub fn with_client(client: Client<OpenAIConfig>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            retry: RetryPolicy::default(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| provider_error("Generation", e))?
            .into();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message])
            .temperature(self.temperature)
            .build()
            .map_err(|e| provider_error("Generation", e))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| provider_error("Generation", e))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| RagChatError::provider("Generation", "Empty response from model", false))
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let answer = self.retry.run("Generation", || self.complete(prompt)).await?;
        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
