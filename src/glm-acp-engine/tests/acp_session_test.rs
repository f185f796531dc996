//! End-to-end tests of the stdio transport driven through in-memory pipes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glm_acp_client::{GlmClient, GlmConfig};
use glm_acp_engine::{AcpConfig, AcpHandler, AcpServer, ChatBackend, Turn};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Replies with the last user message, repeated `times` times.
struct EchoBackend {
    times: usize,
}

#[async_trait]
impl ChatBackend for EchoBackend {
    async fn reply(&self, history: &[Turn]) -> anyhow::Result<String> {
        let last = history.last().map(Turn::content).unwrap_or_default();
        Ok(last.repeat(self.times))
    }
}

fn server_with(backend: Arc<dyn ChatBackend>, root: &Path) -> AcpServer {
    let config = AcpConfig::new(root).with_chunk_delay(Duration::ZERO);
    AcpServer::new(AcpHandler::new(config, backend))
}

async fn run_lines(server: &mut AcpServer, input: &str) -> Vec<Value> {
    let mut output = Vec::new();
    server
        .serve(input.as_bytes(), &mut output)
        .await
        .expect("transport should not fail");

    String::from_utf8(output)
        .expect("output is UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each output line is JSON"))
        .collect()
}

fn request(id: i64, method: &str, params: Value) -> String {
    format!(
        "{}\n",
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
    )
}

#[tokio::test]
async fn test_full_conversation_flow() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(EchoBackend { times: 30 }), dir.path());

    let input = [
        request(1, "initialize", json!({"protocolVersion": 1})),
        request(
            2,
            "session/new",
            json!({"projectPath": dir.path().to_string_lossy()}),
        ),
        request(
            3,
            "session/prompt",
            json!({"sessionId": "glm-session-001", "content": [{"type": "text", "text": "abcd"}]}),
        ),
    ]
    .concat();

    let messages = run_lines(&mut server, &input).await;

    // initialize, session/new, 3 chunks (120 chars), prompt response
    assert_eq!(messages.len(), 6);
    assert_eq!(messages[0]["id"], 1);
    assert_eq!(messages[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(messages[1]["id"], 2);
    assert_eq!(messages[1]["result"]["sessionId"], "glm-session-001");

    let chunks = &messages[2..5];
    for chunk in chunks {
        assert_eq!(chunk["method"], "session/update");
        assert!(chunk.get("id").is_none());
        assert_eq!(chunk["params"]["sessionUpdate"], "agent_message_chunk");
    }
    let streamed: String = chunks
        .iter()
        .map(|c| c["params"]["content"]["text"].as_str().unwrap())
        .collect();
    assert_eq!(streamed, "abcd".repeat(30));

    assert_eq!(
        messages[5],
        json!({"jsonrpc": "2.0", "id": 3, "result": {"stopReason": "completed"}})
    );
    assert_eq!(server.handler().session().history().len(), 2);
}

#[tokio::test]
async fn test_bad_lines_do_not_stop_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(EchoBackend { times: 1 }), dir.path());

    let input = format!(
        "not json\n\n   \n[1,2,3]\n{}\n{}",
        r#"{"jsonrpc":"2.0","id":"a","method":"foo/bar"}"#,
        request(7, "session/cancel", json!({})),
    );

    let messages = run_lines(&mut server, &input).await;

    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["error"]["code"], -32700);
    assert_eq!(messages[0]["id"], Value::Null);
    assert_eq!(messages[1]["error"]["code"], -32600);
    assert_eq!(messages[1]["id"], Value::Null);
    assert_eq!(messages[2]["error"]["code"], -32601);
    assert_eq!(messages[2]["error"]["message"], "Method not found: foo/bar");
    assert_eq!(messages[2]["id"], "a");
    assert_eq!(messages[3], json!({"jsonrpc": "2.0", "id": 7, "result": {}}));
}

#[tokio::test]
async fn test_last_line_without_newline_is_processed() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(EchoBackend { times: 1 }), dir.path());

    let messages = run_lines(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"session/set_mode","params":null}"#,
    )
    .await;

    assert_eq!(messages, vec![json!({"jsonrpc": "2.0", "id": 1, "result": {}})]);
}

#[tokio::test]
async fn test_empty_input_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(EchoBackend { times: 1 }), dir.path());

    let messages = run_lines(&mut server, "").await;
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_file_round_trip_over_transport() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(EchoBackend { times: 1 }), dir.path());

    let input = [
        request(
            1,
            "fs/write_text_file",
            json!({"sessionId": "glm-session-001", "path": "notes/todo.md", "content": "one\ntwo\nthree"}),
        ),
        request(
            2,
            "fs/read_text_file",
            json!({"sessionId": "glm-session-001", "path": "notes/todo.md", "line": 2}),
        ),
        request(3, "fs/read_text_file", json!({"path": "missing.md"})),
    ]
    .concat();

    let messages = run_lines(&mut server, &input).await;

    assert_eq!(messages[0]["result"], json!({}));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("notes/todo.md")).unwrap(),
        "one\ntwo\nthree"
    );
    assert_eq!(messages[1]["result"], json!({"content": "two\nthree"}));
    assert_eq!(messages[2]["error"]["code"], -32602);
    assert_eq!(messages[2]["error"]["message"], "File not found: missing.md");
}

#[tokio::test]
async fn test_prompt_through_glm_client() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/paas/v4/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello from GLM"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let mut config = GlmConfig::new("test-key");
    config.base_url = format!("{}/api/paas/v4/", mock.uri());
    let client = GlmClient::new(config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(client), dir.path());

    let input = request(
        1,
        "session/prompt",
        json!({"content": [{"type": "text", "text": "Hi"}]}),
    );
    let messages = run_lines(&mut server, &input).await;

    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[0]["params"]["content"],
        json!({"type": "text", "text": "Hello from GLM"})
    );
    assert_eq!(messages[1]["result"]["stopReason"], "completed");
}

#[tokio::test]
async fn test_remote_failure_is_reported_and_loop_continues() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&mock)
        .await;

    let mut config = GlmConfig::new("test-key");
    config.base_url = format!("{}/v4", mock.uri());
    let client = GlmClient::new(config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(client), dir.path());

    let input = [
        request(1, "session/prompt", json!({"content": [{"type": "text", "text": "Hi"}]})),
        request(2, "initialize", json!({})),
    ]
    .concat();
    let messages = run_lines(&mut server, &input).await;

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["id"], 1);
    assert_eq!(messages[0]["error"]["code"], -32603);
    let message = messages[0]["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("GLM API error:"), "{message}");
    assert!(message.contains("500"), "{message}");
    assert_eq!(messages[1]["id"], 2);
    assert_eq!(server.handler().session().history().len(), 1);
}

#[tokio::test]
async fn test_lone_surrogates_are_dropped_not_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(EchoBackend { times: 1 }), dir.path());

    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"fs/write_text_file","params":{"path":"a.txt","content":"x\ud800y"}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"session/prompt","params":{"content":[{"type":"text","text":"hi \ud83d"}]}}"#,
        "\n",
    );

    let messages = run_lines(&mut server, input).await;

    assert_eq!(messages[0], json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "xy"
    );

    let last = messages.last().unwrap();
    assert_eq!(last["id"], 2);
    assert_eq!(last["result"]["stopReason"], "completed");
    assert_eq!(messages[1]["params"]["content"]["text"], "hi ");
    assert_eq!(server.handler().session().history()[0].content(), "hi ");
}

#[tokio::test]
async fn test_unusual_ids_and_versions_reach_the_dispatcher() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = server_with(Arc::new(EchoBackend { times: 1 }), dir.path());

    let input = concat!(
        r#"{"jsonrpc":"2.0","id":true,"method":"initialize"}"#,
        "\n",
        r#"{"jsonrpc":2,"id":5,"method":"session/cancel"}"#,
        "\n",
        r#"{"id":{"seq":[1,2]},"method":7}"#,
        "\n",
    );

    let messages = run_lines(&mut server, input).await;

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["id"], true);
    assert_eq!(messages[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(messages[1], json!({"jsonrpc": "2.0", "id": 5, "result": {}}));
    assert_eq!(messages[2]["id"], json!({"seq": [1, 2]}));
    assert_eq!(messages[2]["error"]["code"], -32601);
    assert_eq!(messages[2]["error"]["message"], "Method not found: 7");
}
