//! GLM client for the glm-acp bridge
//!
//! This crate provides a thin client for the hosted GLM chat-completions API.
//! The bridge sends the whole conversation on every call and reads back the
//! first choice's message text.

mod client;
mod config;
mod models;

pub use client::GlmClient;
pub use config::GlmConfig;
pub use models::{ChatChoice, ChatMessage, ChatRequest, ChatResponse, ResponseMessage, Usage};

/// Default GLM API base URL
pub const DEFAULT_GLM_API_BASE: &str = "https://open.bigmodel.cn/api/paas/v4/";

/// Default GLM model
pub const DEFAULT_GLM_MODEL: &str = "glm-4.6";

/// Environment variable holding the API key
pub const GLM_API_KEY_ENV: &str = "GLM_API_KEY";

/// Environment variable overriding the API base URL
pub const GLM_API_BASE_ENV: &str = "GLM_API_BASE";

/// Environment variable overriding the model
pub const GLM_MODEL_ENV: &str = "GLM_MODEL";

/// Error types for GLM operations
#[derive(Debug, thiserror::Error)]
pub enum GlmError {
    #[error("GLM_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Server returned error: {status} - {body}")]
    ServerError { status: u16, body: String },

    #[error("Request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for GLM operations
pub type Result<T> = std::result::Result<T, GlmError>;
