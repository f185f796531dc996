//! ACP Server implementation.
//!
//! Newline-delimited JSON-RPC over a byte stream. Requests are read and
//! answered strictly in order; notifications produced while a request is in
//! progress are written before its response.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::handler::AcpHandler;
use crate::protocol::{AcpError, AcpNotification, AcpRequest, AcpResponse};
use crate::streaming::NotificationSink;

/// Writes one compact JSON message per line and flushes after each.
pub struct LineWriter<W> {
    inner: W,
}

impl<W> LineWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Serialize `value` and write it as a single line.
    pub async fn write_message<T: Serialize>(&mut self, value: &T) -> std::io::Result<()> {
        let mut json = serde_json::to_vec(value)?;
        json.push(b'\n');
        self.inner.write_all(&json).await?;
        self.inner.flush().await
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W> NotificationSink for LineWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn notify(&mut self, notification: &AcpNotification) -> std::io::Result<()> {
        self.write_message(notification).await
    }
}

/// Decode one input line into a request.
///
/// Bytes that are not UTF-8 JSON are a parse error; JSON that is not a
/// request object is an invalid request. Unpaired UTF-16 surrogate escapes
/// cannot be represented in a Rust string, so they are dropped.
pub fn parse_line(line: &[u8]) -> Result<AcpRequest, AcpError> {
    let text = std::str::from_utf8(line).map_err(|_| AcpError::parse_error())?;
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            let repaired = strip_lone_surrogates(text).ok_or_else(AcpError::parse_error)?;
            debug!(error = %e, "Retrying line without unpaired surrogate escapes");
            serde_json::from_str(&repaired).map_err(|_| AcpError::parse_error())?
        }
    };
    if !value.is_object() {
        return Err(AcpError::invalid_request());
    }
    serde_json::from_value(value).map_err(|_| AcpError::invalid_request())
}

/// Remove `\uXXXX` escapes naming a surrogate that has no partner.
///
/// Returns `None` when there was nothing to remove.
fn strip_lone_surrogates(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut changed = false;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        let Some(unit) = unicode_escape_at(bytes, i) else {
            // Skip the escaped character, which may itself be a backslash.
            i += 2;
            continue;
        };

        match unit {
            0xD800..=0xDBFF => match unicode_escape_at(bytes, i + 6) {
                Some(0xDC00..=0xDFFF) => i += 12,
                _ => {
                    out.push_str(&text[copied..i]);
                    i += 6;
                    copied = i;
                    changed = true;
                }
            },
            0xDC00..=0xDFFF => {
                out.push_str(&text[copied..i]);
                i += 6;
                copied = i;
                changed = true;
            }
            _ => i += 6,
        }
    }

    changed.then(|| {
        out.push_str(&text[copied..]);
        out
    })
}

/// The code unit of a `\uXXXX` escape starting at `at`, if there is one.
fn unicode_escape_at(bytes: &[u8], at: usize) -> Option<u16> {
    let escape = bytes.get(at..at + 6)?;
    if escape[0] != b'\\' || escape[1] != b'u' {
        return None;
    }
    let hex = std::str::from_utf8(&escape[2..]).ok()?;
    u16::from_str_radix(hex, 16).ok()
}

/// ACP server over a line-oriented transport.
pub struct AcpServer {
    /// Request handler.
    handler: AcpHandler,
}

impl AcpServer {
    /// Create a new ACP server.
    pub fn new(handler: AcpHandler) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &AcpHandler {
        &self.handler
    }

    /// Run the server with stdio transport.
    ///
    /// Stdout carries protocol traffic only.
    pub async fn run_stdio(&mut self) -> Result<()> {
        info!(
            session_id = %self.handler.session().session_id(),
            project_root = %self.handler.session().project_root().display(),
            "Starting ACP server on stdio transport"
        );

        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await
    }

    /// Serve requests from `reader` until end of input.
    ///
    /// Returns an error only when the transport itself fails.
    pub async fn serve<R, W>(&mut self, mut reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send,
    {
        let mut writer = LineWriter::new(writer);
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            if line.trim_ascii().is_empty() {
                continue;
            }

            let response = match parse_line(&line) {
                Ok(request) => self.handler.process_request(request, &mut writer).await,
                Err(error) => {
                    warn!(code = error.code, len = line.len(), "Rejected input line");
                    AcpResponse::error(None, error)
                }
            };

            writer.write_message(&response).await?;
        }

        debug!("Input closed");
        Ok(())
    }
}
