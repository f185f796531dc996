//! Wire types for the GLM chat-completions API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat message sent to the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author (user, assistant)
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model to use for completion
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Message inside a response choice.
///
/// `content` may be absent or `null` (for example on tool-call replies).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ResponseMessage {
    fn from_value(value: &Value) -> Self {
        Self {
            role: field(value, "role"),
            content: field(value, "content"),
        }
    }
}

/// Choice in a chat completion response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChatChoice {
    fn from_value(value: &Value) -> Self {
        Self {
            index: field(value, "index"),
            message: value
                .get("message")
                .map(ResponseMessage::from_value)
                .unwrap_or_default(),
            finish_reason: field(value, "finish_reason"),
        }
    }
}

/// Usage statistics for a completion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Chat completion response.
///
/// Every field is optional on the wire. [`ChatResponse::from_value`] decodes
/// each field on its own, so an oddly shaped `id` or `usage` never hides the
/// reply text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Decode a response body leniently.
    pub fn from_value(body: Value) -> Self {
        if !body.is_object() {
            tracing::warn!("Completion response is not a JSON object");
            return Self::default();
        }

        let choices = match body.get("choices") {
            Some(Value::Array(items)) => items.iter().map(ChatChoice::from_value).collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                tracing::warn!(choices = %other, "Unexpected completion choices shape");
                Vec::new()
            }
        };

        Self {
            id: body.get("id").filter(|id| !id.is_null()).cloned(),
            model: field(&body, "model"),
            choices,
            usage: field(&body, "usage"),
        }
    }

    /// Get the first choice's message content, if any
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

/// Decode `value[key]`, treating a missing or mismatched field as absent.
fn field<T: DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    value
        .get(key)
        .and_then(|v| T::deserialize(v).ok())
}
