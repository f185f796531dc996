//! GLM client implementation

use std::time::Duration;

use crate::config::GlmConfig;
use crate::models::{ChatMessage, ChatRequest, ChatResponse};
use crate::{GlmError, Result};

/// Client for the hosted GLM chat-completions endpoint
#[derive(Clone)]
pub struct GlmClient {
    client: reqwest::Client,
    config: GlmConfig,
}

impl GlmClient {
    /// Create a new client from configuration
    pub fn new(config: GlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &GlmConfig {
        &self.config
    }

    /// Get the configured model
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the request sent for a conversation
    pub fn build_request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest::new(&self.config.model, messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
    }

    /// Send a chat completion request
    ///
    /// A non-2xx status is an error carrying the status and body. A 2xx body
    /// that is JSON but not shaped like a completion yields an empty response.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.config.completions_url();
        tracing::debug!(
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GlmError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        Ok(ChatResponse::from_value(body))
    }

    /// Send a conversation and return the first choice's text
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = self.build_request(messages);
        let response = self.chat_completion(&request).await?;
        Ok(response.content().unwrap_or_default().to_string())
    }
}
