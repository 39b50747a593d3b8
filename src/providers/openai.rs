//! OpenAI-compatible provider implementation for Co-Pilot Board
//!
//! This module implements the Provider trait against any endpoint that
//! speaks the `/chat/completions` protocol. The base URL is configurable,
//! which lets tests point the provider at a mock server.

use crate::config::ProviderConfig;
use crate::error::{CoboardError, Result};
use crate::providers::{CompletionOptions, CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI chat completions provider
///
/// # Examples
///
/// ```no_run
/// use coboard::config::ProviderConfig;
/// use coboard::providers::{CompletionOptions, Message, OpenAiProvider, Provider};
///
/// # async fn example() -> coboard::error::Result<()> {
/// let config = ProviderConfig {
///     api_key: Some("sk-...".to_string()),
///     ..Default::default()
/// };
/// let provider = OpenAiProvider::new(config)?;
/// let completion = provider
///     .complete(&[Message::user("Hallo")], &CompletionOptions::new(0.7, 1000))
///     .await?;
/// println!("{}", completion.content());
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
    api_key: String,
}

/// Request structure for the chat completions API
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

/// Response structure from the chat completions API
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

/// Choice in a completions response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

/// Message returned inside a choice; content may be null
#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Token usage information from the API
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

impl OpenAiProvider {
    /// Create a new provider instance
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when no API key is configured, or a
    /// provider error if the HTTP client cannot be built
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CoboardError::MissingCredentials("openai".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("coboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoboardError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Full URL of the completions endpoint
    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let request = OpenAiRequest {
            model: &self.config.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        tracing::debug!(
            "Sending completion request: {} messages, max_tokens={}",
            messages.len(),
            options.max_tokens
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request failed: {}", e);
                CoboardError::Provider(format!("Completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI API returned error {}: {}", status, error_text);
            return Err(CoboardError::Provider(format!(
                "OpenAI API error: {} {}",
                status, error_text
            ))
            .into());
        }

        let body: OpenAiResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse completion response: {}", e);
            CoboardError::Provider(format!("Failed to parse completion response: {}", e))
        })?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            CoboardError::Provider("Completion response contained no choices".to_string())
        })?;

        let message = Message {
            role: choice.message.role.unwrap_or_else(|| "assistant".to_string()),
            content: choice.message.content.unwrap_or_default(),
        };

        Ok(match body.usage {
            Some(usage) => CompletionResponse::with_usage(
                message,
                TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
            ),
            None => CompletionResponse::new(message),
        })
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
