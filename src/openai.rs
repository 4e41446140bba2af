//! OpenAI client configuration and request retries.

use crate::config::Settings;
use crate::error::{RagChatError, Result};
use async_openai::error::OpenAIError;
use async_openai::{config::OpenAIConfig, Client};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Create an OpenAI client from settings.
///
/// Fails with a configuration error when no API key is available.
pub fn create_client(settings: &Settings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key()?;
    create_client_with_timeout(
        &api_key,
        settings.provider.api_base.as_deref(),
        Duration::from_secs(settings.provider.request_timeout_secs),
    )
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    api_key: &str,
    api_base: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Convert an API error into a provider error, marking transport failures as retryable.
pub fn provider_error(operation: &'static str, err: OpenAIError) -> RagChatError {
    let retryable = matches!(err, OpenAIError::Reqwest(_));
    RagChatError::provider(operation, err.to_string(), retryable)
}

/// Bounded exponential backoff for provider calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Run `op`, retrying only errors that report themselves as retryable.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    attempt += 1;
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        label,
                        attempt,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}
