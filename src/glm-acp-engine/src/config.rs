//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::DEFAULT_SESSION_ID;
use crate::streaming::{DEFAULT_CHUNK_DELAY, DEFAULT_CHUNK_SIZE};

/// Configuration for the ACP handler.
#[derive(Debug, Clone)]
pub struct AcpConfig {
    /// Initial project root. `session/new` may replace it.
    pub project_root: PathBuf,
    /// Identifier reported for the single session.
    pub session_id: String,
    /// Characters per streamed chunk.
    pub chunk_size: usize,
    /// Pause between streamed chunks.
    pub chunk_delay: Duration,
}

impl Default for AcpConfig {
    fn default() -> Self {
        let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(project_root)
    }
}

impl AcpConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
        }
    }

    /// Set the pause between streamed chunks.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }
}
