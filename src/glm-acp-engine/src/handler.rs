//! ACP request handlers.
//!
//! This module contains the business logic for handling ACP protocol requests:
//! the session lifecycle, prompt processing with streamed replies, and
//! project-scoped file access.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::backend::ChatBackend;
use crate::config::AcpConfig;
use crate::fs::{FileAccessor, FsError, select_lines};
use crate::protocol::{
    AcpError, AcpRequest, AcpRequestId, AcpResponse, JSONRPC_VERSION, methods,
};
use crate::session::{Session, SessionMode, Turn, resolve_project_root};
use crate::streaming::{MessageStreamer, NotificationSink};
use crate::types::*;

/// ACP request handler.
///
/// Owns the single session. Requests are processed one at a time through
/// `&mut self`, so session state needs no locking.
pub struct AcpHandler {
    /// The active session.
    session: Session,
    /// Remote completion backend.
    backend: Arc<dyn ChatBackend>,
    /// Reply streamer.
    streamer: MessageStreamer,
}

impl AcpHandler {
    /// Create a new handler.
    pub fn new(config: AcpConfig, backend: Arc<dyn ChatBackend>) -> Self {
        let project_root =
            resolve_project_root(&config.project_root).unwrap_or(config.project_root);
        Self {
            session: Session::new(config.session_id, project_root),
            backend,
            streamer: MessageStreamer::new(config.chunk_size, config.chunk_delay),
        }
    }

    /// The active session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handle initialize request.
    pub async fn handle_initialize(&self, params: InitializeRequest) -> InitializeResponse {
        if let Some(client) = &params.client_info {
            info!(client = %client.name, version = %client.version, "Client connected");
        }

        InitializeResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            agent_capabilities: AgentCapabilities {
                load_session: false,
                prompt_capabilities: PromptCapabilities {
                    audio: false,
                    embedded_content: false,
                    image: false,
                },
            },
            agent_info: AgentInfo {
                name: AGENT_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            auth_methods: vec![],
        }
    }

    /// Handle session/new request.
    ///
    /// Re-roots the session; the conversation history is kept.
    pub async fn handle_session_new(
        &mut self,
        params: NewSessionRequest,
    ) -> Result<NewSessionResponse, AcpError> {
        if let Some(requested) = params.project_path.or(params.cwd) {
            let root = resolve_project_root(Path::new(&requested)).map_err(|e| {
                AcpError::internal(format!("Invalid project path {requested}: {e}"))
            })?;
            self.session.set_project_root(root);
        }

        info!(
            session_id = %self.session.session_id(),
            project_root = %self.session.project_root().display(),
            history = self.session.history().len(),
            "Session ready"
        );

        Ok(NewSessionResponse {
            session_id: self.session.session_id().to_string(),
            modes: SessionMode::advertised(self.session.current_mode()),
        })
    }

    /// Handle session/prompt request.
    pub async fn handle_session_prompt(
        &mut self,
        params: PromptRequest,
        sink: &mut dyn NotificationSink,
    ) -> Result<PromptResponse, AcpError> {
        let message = params.text();
        if message.is_empty() {
            return Err(AcpError::invalid_params("No message content provided"));
        }

        // The user turn stays in history even if the remote call fails.
        self.session.push(Turn::user(message));

        let reply = self
            .backend
            .reply(self.session.history())
            .await
            .map_err(|e| {
                error!(error = %e, "Completion request failed");
                AcpError::internal(format!("GLM API error: {e}"))
            })?;

        self.session.push(Turn::assistant(reply.clone()));

        let chunks = self
            .streamer
            .stream_message(self.session.session_id(), &reply, sink)
            .await
            .map_err(|e| AcpError::internal(format!("Failed to stream reply: {e}")))?;
        debug!(chunks, reply_len = reply.len(), "Reply streamed");

        Ok(PromptResponse {
            stop_reason: StopReason::Completed,
        })
    }

    /// Handle session/cancel request.
    ///
    /// Requests are processed sequentially, so there is never an in-flight
    /// prompt to interrupt by the time this runs.
    pub async fn handle_session_cancel(&self, params: CancelRequest) -> CancelResponse {
        debug!(session_id = ?params.session_id, "Cancel requested, nothing in flight");
        CancelResponse {}
    }

    /// Handle session/set_mode request. The mode is not validated or stored.
    pub async fn handle_session_set_mode(&self, params: SetModeRequest) -> SetModeResponse {
        debug!(mode_id = %params.mode_id, "Set mode requested");
        SetModeResponse {}
    }

    /// Handle fs/read_text_file request.
    pub async fn handle_read_text_file(
        &self,
        params: ReadTextFileRequest,
    ) -> Result<ReadTextFileResponse, AcpError> {
        let files = FileAccessor::new(self.session.project_root());
        let content = files.read(&params.path).await.map_err(|e| match e {
            FsError::NotFound(_) => AcpError::invalid_params(e.to_string()),
            FsError::Io(_) => AcpError::internal(format!("Error reading file: {e}")),
        })?;

        Ok(ReadTextFileResponse {
            content: select_lines(&content, params.line, params.limit),
        })
    }

    /// Handle fs/write_text_file request.
    pub async fn handle_write_text_file(
        &self,
        params: WriteTextFileRequest,
    ) -> Result<WriteTextFileResponse, AcpError> {
        let files = FileAccessor::new(self.session.project_root());
        files
            .write(&params.path, &params.content)
            .await
            .map_err(|e| AcpError::internal(format!("Error writing file: {e}")))?;

        debug!(path = %params.path, bytes = params.content.len(), "File written");
        Ok(WriteTextFileResponse {})
    }

    /// Process a JSON-RPC request and return its response.
    ///
    /// Every outcome, including a panicking handler, becomes a response
    /// carrying the request's id.
    pub async fn process_request(
        &mut self,
        request: AcpRequest,
        sink: &mut dyn NotificationSink,
    ) -> AcpResponse {
        let id = request.id.clone();
        let params = request.params_or_empty();
        debug!(method = %request.method, id = ?id, "Received request");

        let outcome = AssertUnwindSafe(self.dispatch(&request.method, params, sink))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => AcpResponse::success(id, result),
            Ok(Err(error)) => AcpResponse::error(id, error),
            Err(panic) => {
                let description = panic_description(panic.as_ref());
                error!(method = %request.method, error = %description, "Handler panicked");
                AcpResponse::error(id, AcpError::internal(format!("Internal error: {description}")))
            }
        }
    }

    /// Convenience wrapper when the caller only has the raw parts.
    pub async fn process(
        &mut self,
        id: Option<AcpRequestId>,
        method: &str,
        params: Value,
        sink: &mut dyn NotificationSink,
    ) -> AcpResponse {
        let request = AcpRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.to_string(),
            params: Some(params),
        };
        self.process_request(request, sink).await
    }

    async fn dispatch(
        &mut self,
        method: &str,
        params: Value,
        sink: &mut dyn NotificationSink,
    ) -> Result<Value, AcpError> {
        match method {
            methods::INITIALIZE => encode(self.handle_initialize(decode(params)?).await),
            methods::SESSION_NEW => encode(self.handle_session_new(decode(params)?).await?),
            methods::SESSION_PROMPT => {
                encode(self.handle_session_prompt(decode(params)?, sink).await?)
            }
            methods::SESSION_CANCEL => encode(self.handle_session_cancel(decode(params)?).await),
            methods::SESSION_SET_MODE => {
                encode(self.handle_session_set_mode(decode(params)?).await)
            }
            methods::FS_READ_TEXT_FILE => {
                encode(self.handle_read_text_file(decode(params)?).await?)
            }
            methods::FS_WRITE_TEXT_FILE => {
                encode(self.handle_write_text_file(decode(params)?).await?)
            }
            _ => {
                warn!(method = %method, "Unknown method");
                Err(AcpError::method_not_found(method))
            }
        }
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, AcpError> {
    serde_json::from_value(params)
        .map_err(|e| AcpError::invalid_params(format!("Invalid params: {e}")))
}

fn encode<T: Serialize>(response: T) -> Result<Value, AcpError> {
    serde_json::to_value(response).map_err(|e| AcpError::internal(e.to_string()))
}

fn panic_description(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
