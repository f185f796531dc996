//! ACP (Agent Client Protocol) agent backed by the GLM chat API.
//!
//! This crate implements the agent side of ACP, enabling editors like Zed
//! to hold a conversation with a GLM model over stdio.
//!
//! ## Protocol Overview
//!
//! ACP uses newline-delimited JSON-RPC 2.0:
//! - `initialize` - Advertise protocol version and capabilities
//! - `session/new` - Create (or re-root) the single session
//! - `session/prompt` - Send a prompt and stream the reply
//! - `session/cancel` - Accepted, nothing to cancel
//! - `session/set_mode` - Accepted, only `chat` exists
//! - `fs/read_text_file` - Read a file under the project root
//! - `fs/write_text_file` - Write a file under the project root
//!
//! ## Streaming
//!
//! Replies are delivered as `session/update` notifications carrying
//! `agent_message_chunk` updates, all written before the prompt's response.

pub mod backend;
pub mod config;
pub mod fs;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod session;
pub mod streaming;
pub mod types;

pub use backend::ChatBackend;
pub use config::AcpConfig;
pub use handler::AcpHandler;
pub use protocol::{AcpError, AcpNotification, AcpRequest, AcpRequestId, AcpResponse};
pub use server::{AcpServer, LineWriter};
pub use session::{Role, Session, SessionMode, Turn};
pub use streaming::{MessageStreamer, NotificationSink};
pub use types::*;
