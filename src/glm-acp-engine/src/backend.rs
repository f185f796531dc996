//! Remote completion backend.

use anyhow::Result;
use async_trait::async_trait;
use glm_acp_client::{ChatMessage, GlmClient};

use crate::session::{Role, Turn};

/// Produces the assistant reply for a conversation.
///
/// The full history is passed on every call, oldest turn first.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Return the reply text. A reply without content is an empty string,
    /// not an error.
    async fn reply(&self, history: &[Turn]) -> Result<String>;
}

/// Convert session turns into API messages, preserving order.
pub fn to_chat_messages(history: &[Turn]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|turn| match turn.role() {
            Role::User => ChatMessage::user(turn.content()),
            Role::Assistant => ChatMessage::assistant(turn.content()),
        })
        .collect()
}

#[async_trait]
impl ChatBackend for GlmClient {
    async fn reply(&self, history: &[Turn]) -> Result<String> {
        let reply = self.complete(to_chat_messages(history)).await?;
        Ok(reply)
    }
}
