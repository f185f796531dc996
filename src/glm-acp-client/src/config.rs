//! Client configuration.

use std::time::Duration;

use crate::{
    DEFAULT_GLM_API_BASE, DEFAULT_GLM_MODEL, GLM_API_BASE_ENV, GLM_API_KEY_ENV, GLM_MODEL_ENV,
    GlmError, Result,
};

/// Configuration for [`crate::GlmClient`].
#[derive(Clone)]
pub struct GlmConfig {
    /// Bearer credential for the API.
    pub api_key: String,
    /// Base URL; `chat/completions` is appended to it.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate per reply.
    pub max_tokens: u32,
    /// Upper bound for a single completion call.
    pub request_timeout: Duration,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

impl GlmConfig {
    /// Create a configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GLM_API_BASE.to_string(),
            model: DEFAULT_GLM_MODEL.to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(GLM_API_KEY_ENV)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(GlmError::MissingApiKey)?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(GLM_API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }

        if let Some(model) = lookup(GLM_MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }

        Ok(config)
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for GlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
