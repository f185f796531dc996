//! Streamed delivery of assistant replies.
//!
//! A completed reply is cut into fixed-size chunks and each chunk is sent as
//! one `session/update` notification. The chunk source is a [`Stream`], so a
//! genuinely incremental source can replace the fixed chunker without
//! changing what the client observes.

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::trace;

use crate::protocol::{AcpNotification, methods};
use crate::types::{MessageContent, SessionNotification, SessionUpdate};

/// Default chunk size, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Default pause between two chunks.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(100);

/// Destination for server-to-client notifications.
///
/// Each notification must be fully written (and flushed) before `notify`
/// returns.
#[async_trait]
pub trait NotificationSink: Send {
    async fn notify(&mut self, notification: &AcpNotification) -> std::io::Result<()>;
}

/// Split `text` into chunks of at most `size` characters.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Build the `session/update` notification carrying one chunk.
pub fn message_chunk_notification(
    session_id: &str,
    chunk: String,
) -> serde_json::Result<AcpNotification> {
    let params = SessionNotification {
        session_id: session_id.to_string(),
        update: SessionUpdate::AgentMessageChunk {
            content: MessageContent::Text { text: chunk },
        },
    };
    Ok(AcpNotification::new(methods::SESSION_UPDATE).with_params(serde_json::to_value(params)?))
}

/// Emits assistant replies as ordered chunk notifications.
#[derive(Debug, Clone)]
pub struct MessageStreamer {
    chunk_size: usize,
    delay: Duration,
}

impl Default for MessageStreamer {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_DELAY)
    }
}

impl MessageStreamer {
    pub fn new(chunk_size: usize, delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            delay,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Stream a complete reply. Returns the number of notifications sent.
    pub async fn stream_message(
        &self,
        session_id: &str,
        text: &str,
        sink: &mut dyn NotificationSink,
    ) -> std::io::Result<usize> {
        let chunks = futures::stream::iter(chunk_text(text, self.chunk_size));
        self.stream_chunks(session_id, chunks, sink).await
    }

    /// Stream chunks from any finite source, in order.
    pub async fn stream_chunks<S>(
        &self,
        session_id: &str,
        chunks: S,
        sink: &mut dyn NotificationSink,
    ) -> std::io::Result<usize>
    where
        S: Stream<Item = String>,
    {
        let mut chunks = std::pin::pin!(chunks);
        let mut sent = 0;

        while let Some(chunk) = chunks.next().await {
            if sent > 0 {
                self.pause().await;
            }
            trace!(session_id, index = sent, len = chunk.len(), "Sending message chunk");
            let notification = message_chunk_notification(session_id, chunk)?;
            sink.notify(&notification).await?;
            sent += 1;
        }

        Ok(sent)
    }

    async fn pause(&self) {
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
    }
}
