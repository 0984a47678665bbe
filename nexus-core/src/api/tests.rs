// nexus-core/src/api/tests.rs
use super::openai::OpenAiGateway;
use super::*;
use crate::config::RuntimeConfig;
use crate::models::tools::{ToolCall, ToolParameter, ToolParameterType, ToolParametersDefinition};
use httpmock::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

fn test_config(api_url: &str) -> RuntimeConfig {
    RuntimeConfig {
        api_key: "test-key".to_string(),
        api_url: api_url.to_string(),
        model_name: "test-model".to_string(),
        temperature: 0.7,
        max_goal_actions: 20,
    }
}

fn read_file_tool() -> ToolDefinition {
    let mut properties = BTreeMap::new();
    properties.insert(
        "file_path".to_string(),
        ToolParameter {
            param_type: ToolParameterType::String,
            description: "The path to the file to read".to_string(),
        },
    );
    ToolDefinition {
        name: "read_file".to_string(),
        description: "Read the contents of a file from the file system".to_string(),
        parameters: ToolParametersDefinition {
            param_type: "object".to_string(),
            properties,
            required: vec!["file_path".to_string()],
        },
    }
}

#[test]
fn test_build_payload_with_tools() {
    let gateway = OpenAiGateway::new(&test_config("https://api.example.com/v1")).unwrap();
    let messages = vec![ChatMessage::user("Hello")];
    let tools = vec![read_file_tool()];

    let payload = gateway.build_payload(&messages, "session-1", Some(&tools), None);

    assert_eq!(payload["model"], "test-model");
    assert_eq!(payload["messages"][0]["role"], "user");
    assert_eq!(payload["messages"][0]["content"], "Hello");
    assert_eq!(payload["temperature"], 0.7);
    assert_eq!(payload["litellm_session_id"], "session-1");
    assert_eq!(payload["tool_choice"], "auto");
    assert_eq!(payload["tools"][0]["type"], "function");
    assert_eq!(payload["tools"][0]["function"]["name"], "read_file");
    assert_eq!(
        payload["tools"][0]["function"]["parameters"]["required"],
        json!(["file_path"])
    );
    assert_eq!(gateway.endpoint(), "https://api.example.com/v1/chat/completions");
}

#[test]
fn test_build_payload_without_tools_omits_tool_fields() {
    let gateway = OpenAiGateway::new(&test_config("https://api.example.com/v1")).unwrap();
    let payload = gateway.build_payload(&[ChatMessage::user("Hi")], "s", None, Some(0.1));
    assert!(payload.get("tools").is_none());
    assert!(payload.get("tool_choice").is_none());
    assert_eq!(payload["temperature"], 0.1);

    let empty: Vec<ToolDefinition> = Vec::new();
    let payload = gateway.build_payload(&[ChatMessage::user("Hi")], "s", Some(&empty), None);
    assert!(payload.get("tools").is_none());
}

#[test]
fn test_build_headers_carries_bearer_token() {
    let gateway = OpenAiGateway::new(&test_config("https://api.example.com/v1")).unwrap();
    let headers = gateway.build_headers();
    assert_eq!(headers.get("Authorization").unwrap(), "Bearer test-key");
    assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
}

#[test]
fn test_parse_response_takes_first_choice() {
    let body = json!({
        "id": "chatcmpl-1",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "first"}, "finish_reason": "stop"},
            {"index": 1, "message": {"role": "assistant", "content": "second"}, "finish_reason": "stop"}
        ]
    })
    .to_string();
    let message = OpenAiGateway::parse_response(&body).unwrap();
    assert_eq!(message.content.as_deref(), Some("first"));
}

#[test]
fn test_parse_response_rejects_missing_choices() {
    assert!(OpenAiGateway::parse_response(r#"{"id": "x", "choices": []}"#).is_err());
    assert!(OpenAiGateway::parse_response(r#"{"error": "quota"}"#).is_err());
    assert!(OpenAiGateway::parse_response("not json").is_err());
}

#[tokio::test]
async fn test_complete_sends_tools_and_parses_tool_calls() {
    let server = MockServer::start_async().await;
    let gateway = OpenAiGateway::new(&test_config(&server.base_url())).unwrap();
    let messages = vec![ChatMessage::user("Show me a.txt")];
    let tools = vec![read_file_tool()];
    let expected_body = gateway.build_payload(&messages, "session-42", Some(&tools), None);

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body(expected_body.clone());
            then.status(200).json_body(json!({
                "id": "chatcmpl-tools",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "read_file", "arguments": "{\"file_path\":\"a.txt\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            }));
        })
        .await;

    let reply = gateway
        .complete(&messages, "session-42", Some(&tools), None)
        .await
        .unwrap();

    mock.assert_hits(1);
    assert!(reply.content.is_none());
    assert_eq!(
        reply.tool_calls,
        Some(vec![ToolCall::function(
            "call_1",
            "read_file",
            json!({"file_path": "a.txt"})
        )])
    );
}

#[tokio::test]
async fn test_complete_http_error_is_wrapped() {
    let server = MockServer::start_async().await;
    let gateway = OpenAiGateway::new(&test_config(&server.base_url())).unwrap();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500).body("Server error");
        })
        .await;

    let err = gateway
        .complete(&[ChatMessage::user("Ping")], "s", None, None)
        .await
        .unwrap_err();

    // No retry.
    mock.assert_hits(1);
    let text = err.to_string();
    assert!(text.starts_with("API request failed: "), "got: {}", text);
    assert!(text.contains("500"), "got: {}", text);
    assert!(text.contains("Server error"), "got: {}", text);
}

#[tokio::test]
async fn test_follow_up_omits_tools_and_uses_its_own_error_context() {
    let server = MockServer::start_async().await;
    let gateway = OpenAiGateway::new(&test_config(&server.base_url())).unwrap();
    let messages = vec![ChatMessage::user("Ping")];
    let expected_body = gateway.build_payload(&messages, "s", None, None);

    let ok_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body(expected_body.clone());
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "Pong"}}]
            }));
        })
        .await;

    let reply = gateway.follow_up(&messages, "s").await.unwrap();
    ok_mock.assert_hits(1);
    assert_eq!(reply.content.as_deref(), Some("Pong"));

    let failing_server = MockServer::start_async().await;
    let gateway = OpenAiGateway::new(&test_config(&failing_server.base_url())).unwrap();
    failing_server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("quota exceeded");
        })
        .await;

    let err = gateway.follow_up(&messages, "s").await.unwrap_err();
    assert!(err.to_string().starts_with("Follow-up API request failed: "));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_gateway_error() {
    // Port 9 (discard) is not served on loopback in test environments.
    let gateway = OpenAiGateway::new(&test_config("http://127.0.0.1:9")).unwrap();
    let err = gateway
        .complete(&[ChatMessage::user("Ping")], "s", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, NexusError::Gateway { .. }));
    assert!(err.to_string().starts_with("API request failed: POST "));
}

#[tokio::test]
async fn test_unusable_api_key_fails_before_sending() {
    let server = MockServer::start_async().await;
    let mut config = test_config(&server.base_url());
    config.api_key = "sk-broken\nkey".to_string();
    let gateway = OpenAiGateway::new(&config).unwrap();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    assert!(gateway.header_map().is_err());
    let err = gateway
        .complete(&[ChatMessage::user("Ping")], "s", None, None)
        .await
        .unwrap_err();

    mock.assert_hits(0);
    let text = err.to_string();
    assert!(text.starts_with("API request failed: "), "got: {}", text);
    assert!(text.contains("Authorization"), "got: {}", text);
    assert!(!text.contains("sk-broken"), "got: {}", text);
}

#[test]
fn test_header_map_carries_authorization() {
    let gateway = OpenAiGateway::new(&test_config("https://api.example.com/v1")).unwrap();
    let headers = gateway.header_map().unwrap();
    assert_eq!(headers.get("authorization").unwrap(), "Bearer test-key");
}
