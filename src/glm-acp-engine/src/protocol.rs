//! ACP Protocol types and JSON-RPC handling.
//!
//! This module provides the JSON-RPC envelopes for the ACP protocol,
//! including request/response types and error handling.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

/// Any `jsonrpc` value is accepted; only a string is kept.
fn lenient_jsonrpc<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(version) => version,
        _ => default_jsonrpc(),
    })
}

/// A non-string method is dispatched under its JSON text, so it is reported
/// as an unknown method instead of a malformed request.
fn lenient_method<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(method) => method,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// JSON-RPC request for ACP.
///
/// Decoding is lenient: a missing `method` becomes the empty string (and is
/// then reported as an unknown method), missing `params` become an empty map,
/// and `jsonrpc` is not validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcpRequest {
    /// JSON-RPC version.
    #[serde(default = "default_jsonrpc", deserialize_with = "lenient_jsonrpc")]
    pub jsonrpc: String,
    /// Request ID. `None` when absent or `null`.
    #[serde(default)]
    pub id: Option<AcpRequestId>,
    /// Method name.
    #[serde(default, deserialize_with = "lenient_method")]
    pub method: String,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl AcpRequest {
    /// Create a new request.
    pub fn new(id: impl Into<AcpRequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id: Some(id.into()),
            method: method.into(),
            params: None,
        }
    }

    /// Set parameters.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Parameters, with `null`/absent normalized to an empty map.
    pub fn params_or_empty(&self) -> Value {
        match &self.params {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(params) => params.clone(),
        }
    }
}

/// JSON-RPC response for ACP.
///
/// Exactly one of `result` and `error` is set. `id` is always serialized,
/// as `null` when the request carried none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcpResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: Option<AcpRequestId>,
    /// Result (success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AcpError>,
}

impl AcpResponse {
    /// Create a success response.
    pub fn success(id: Option<AcpRequestId>, result: Value) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<AcpRequestId>, error: AcpError) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// JSON-RPC notification for ACP (no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcpNotification {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl AcpNotification {
    /// Create a new notification.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            method: method.into(),
            params: None,
        }
    }

    /// Set parameters.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// Request ID.
///
/// Opaque to the server: whatever JSON value the client sent is echoed back
/// verbatim. `null` is represented as the absence of an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcpRequestId(pub Value);

impl From<i64> for AcpRequestId {
    fn from(id: i64) -> Self {
        Self(Value::from(id))
    }
}

impl From<i32> for AcpRequestId {
    fn from(id: i32) -> Self {
        Self(Value::from(id))
    }
}

impl From<String> for AcpRequestId {
    fn from(id: String) -> Self {
        Self(Value::String(id))
    }
}

impl From<&str> for AcpRequestId {
    fn from(id: &str) -> Self {
        Self(Value::from(id))
    }
}

impl From<Value> for AcpRequestId {
    fn from(id: Value) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AcpRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other}"),
        }
    }
}

/// JSON-RPC error for ACP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcpError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Standard JSON-RPC error codes used by the bridge.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl AcpError {
    fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self::with_code(codes::PARSE_ERROR, "Parse error")
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self::with_code(codes::INVALID_REQUEST, "Invalid Request")
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self::with_code(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
        )
    }

    /// Invalid params (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::with_code(codes::INVALID_PARAMS, message)
    }

    /// Internal error (-32603).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(codes::INTERNAL_ERROR, message)
    }
}

impl std::fmt::Display for AcpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for AcpError {}

/// ACP method names.
pub mod methods {
    /// Initialize the connection.
    pub const INITIALIZE: &str = "initialize";
    /// Create (or re-root) the session.
    pub const SESSION_NEW: &str = "session/new";
    /// Send a prompt to the session.
    pub const SESSION_PROMPT: &str = "session/prompt";
    /// Cancel the current operation.
    pub const SESSION_CANCEL: &str = "session/cancel";
    /// Switch session mode.
    pub const SESSION_SET_MODE: &str = "session/set_mode";
    /// Session update notification.
    pub const SESSION_UPDATE: &str = "session/update";
    /// Read a text file under the project root.
    pub const FS_READ_TEXT_FILE: &str = "fs/read_text_file";
    /// Write a text file under the project root.
    pub const FS_WRITE_TEXT_FILE: &str = "fs/write_text_file";
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_id_variants_round_trip_verbatim() {
        for raw in [json!(7), json!(-3), json!(1.5), json!("abc")] {
            let request: AcpRequest =
                serde_json::from_value(json!({"jsonrpc": "2.0", "id": raw, "method": "x"}))
                    .unwrap();
            let response = AcpResponse::success(request.id, json!({}));
            let encoded = serde_json::to_value(&response).unwrap();
            assert_eq!(encoded["id"], raw);
        }
    }

    #[test]
    fn test_null_and_absent_id() {
        let request: AcpRequest =
            serde_json::from_value(json!({"id": null, "method": "x"})).unwrap();
        assert!(request.id.is_none());

        let request: AcpRequest = serde_json::from_value(json!({"method": "x"})).unwrap();
        assert!(request.id.is_none());
        assert_eq!(request.jsonrpc, "2.0");

        let encoded = serde_json::to_value(AcpResponse::success(None, json!({}))).unwrap();
        assert_eq!(encoded, json!({"jsonrpc": "2.0", "id": null, "result": {}}));
    }

    #[test]
    fn test_any_id_shape_is_echoed() {
        for raw in [json!(true), json!({"a": 1}), json!([1, "two"])] {
            let request: AcpRequest =
                serde_json::from_value(json!({"id": raw, "method": "x"})).unwrap();
            let response = AcpResponse::error(request.id, AcpError::method_not_found("x"));
            assert_eq!(serde_json::to_value(&response).unwrap()["id"], raw);
        }
    }

    #[test]
    fn test_jsonrpc_and_method_are_lenient() {
        let request: AcpRequest =
            serde_json::from_value(json!({"jsonrpc": 2, "id": 1, "method": "session/cancel"}))
                .unwrap();
        assert_eq!(request.jsonrpc, "2.0");
        assert_eq!(request.method, "session/cancel");

        let request: AcpRequest = serde_json::from_value(json!({"id": 1, "method": 7})).unwrap();
        assert_eq!(request.method, "7");

        let request: AcpRequest =
            serde_json::from_value(json!({"id": 1, "method": null})).unwrap();
        assert_eq!(request.method, "");
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(AcpRequestId::from("abc").to_string(), "abc");
        assert_eq!(AcpRequestId::from(7).to_string(), "7");
    }

    #[test]
    fn test_params_or_empty() {
        let request = AcpRequest::new(1, "x");
        assert_eq!(request.params_or_empty(), json!({}));

        let request = AcpRequest::new(1, "x").with_params(Value::Null);
        assert_eq!(request.params_or_empty(), json!({}));

        let request = AcpRequest::new(1, "x").with_params(json!({"a": 1}));
        assert_eq!(request.params_or_empty(), json!({"a": 1}));
    }

    #[test]
    fn test_error_response_shape() {
        let response = AcpResponse::error(Some(3.into()), AcpError::method_not_found("foo/bar"));
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(
            encoded,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "error": {"code": -32601, "message": "Method not found: foo/bar"}
            })
        );
        assert!(encoded.get("result").is_none());
    }

    #[test]
    fn test_notification_has_no_id() {
        let notification = AcpNotification::new(methods::SESSION_UPDATE).with_params(json!({}));
        let encoded = serde_json::to_value(&notification).unwrap();
        assert!(encoded.get("id").is_none());
        assert_eq!(encoded["method"], "session/update");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AcpError::parse_error().code, -32700);
        assert_eq!(AcpError::parse_error().message, "Parse error");
        assert_eq!(AcpError::invalid_request().code, -32600);
        assert_eq!(AcpError::invalid_params("x").code, -32602);
        assert_eq!(AcpError::internal("x").code, -32603);
    }
}
