use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ACP Protocol Version advertised on `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Agent name advertised on `initialize`.
pub const AGENT_NAME: &str = "glm-acp";

/// ACP Initialize Request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    #[serde(default)]
    pub protocol_version: Option<Value>,
    #[serde(default)]
    pub client_capabilities: Option<Value>,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// ACP Initialize Response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    pub protocol_version: String,
    pub agent_capabilities: AgentCapabilities,
    pub agent_info: AgentInfo,
    #[serde(default)]
    pub auth_methods: Vec<Value>,
}

/// Agent Capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    pub load_session: bool,
    pub prompt_capabilities: PromptCapabilities,
}

/// Prompt Capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCapabilities {
    pub audio: bool,
    pub embedded_content: bool,
    pub image: bool,
}

/// Client Info.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Agent Info.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub name: String,
    pub version: String,
}

/// New Session Request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    #[serde(default)]
    pub project_path: Option<String>,
    /// ACP-standard working directory, used when `projectPath` is absent.
    #[serde(default)]
    pub cwd: Option<String>,
}

/// New Session Response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub session_id: String,
    pub modes: SessionModes,
}

/// Session Modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionModes {
    pub current_mode_id: String,
    pub available_modes: Vec<ModeInfo>,
}

/// Mode Info.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Prompt Request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default, alias = "prompt")]
    pub content: Vec<ContentBlock>,
}

impl PromptRequest {
    /// Concatenated text of every `text` block, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

/// Prompt content block.
///
/// Only `text` blocks carry meaning for the bridge; any other type
/// (image, audio, resource...) is accepted and ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// Prompt Response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub stop_reason: StopReason,
}

/// Stop Reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
}

/// Cancel request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Cancel response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelResponse {}

fn default_mode_id() -> String {
    "chat".to_string()
}

/// Set mode request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetModeRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_mode_id")]
    pub mode_id: String,
}

/// Set mode response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetModeResponse {}

/// Read text file request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadTextFileRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub path: String,
    /// 1-based first line.
    #[serde(default)]
    pub line: Option<i64>,
    /// Number of lines from `line`.
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Read text file response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadTextFileResponse {
    pub content: String,
}

/// Write text file request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteTextFileRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// Write text file response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteTextFileResponse {}

/// Session Notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionNotification {
    pub session_id: String,
    #[serde(flatten)]
    pub update: SessionUpdate,
}

/// Session Update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "sessionUpdate", rename_all = "snake_case")]
pub enum SessionUpdate {
    AgentMessageChunk { content: MessageContent },
}

/// Message Content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text { text: String },
}
