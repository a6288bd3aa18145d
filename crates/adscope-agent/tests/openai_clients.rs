//! Integration tests for the OpenAI-compatible clients using wiremock HTTP mocks.

use adscope_agent::{
    AgentError, ChatMessage, ChatModel, Embedder, OpenAiChatClient, OpenAiEmbedder,
};
use adscope_agent::tools::tool_schemas;
use adscope_core::EMBEDDING_DIMENSIONS;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_client(base_url: &str) -> OpenAiChatClient {
    OpenAiChatClient::new("test-key", base_url, "gpt-test", 30)
        .expect("client construction should not fail")
}

fn embedder(base_url: &str) -> OpenAiEmbedder {
    OpenAiEmbedder::new("test-key", base_url, "embed-test", 30)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn chat_turn_parses_tool_calls() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "finish_reason": "tool_calls",
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {
                        "name": "filter_campaigns",
                        "arguments": "{\"channel\":[\"instagram\"]}"
                    }
                }]
            }
        }]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-test",
            "tool_choice": "auto",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = chat_client(&server.uri());
    let turn = client
        .chat_turn(&[ChatMessage::user("instagram ads")], &tool_schemas())
        .await
        .expect("should parse turn");

    assert!(turn.text.is_none());
    assert_eq!(turn.tool_calls.len(), 1);
    assert_eq!(turn.tool_calls[0].id, "call_abc");
    assert_eq!(turn.tool_calls[0].name, "filter_campaigns");
    assert_eq!(turn.tool_calls[0].arguments, r#"{"channel":["instagram"]}"#);
}

#[tokio::test]
async fn chat_turn_assigns_ids_to_tool_calls_without_one() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "type": "function",
                            "function": { "name": "search_offers", "arguments": "{\"query\":\"0% APR\"}" }
                        },
                        {
                            "id": null,
                            "function": { "name": "full_text_search", "arguments": "{\"query\":\"travel\"}" }
                        }
                    ]
                }
            }]
        })))
        .mount(&server)
        .await;

    let turn = chat_client(&server.uri())
        .chat_turn(&[ChatMessage::user("0% APR offers")], &tool_schemas())
        .await
        .expect("missing ids should not fail the turn");

    let ids: Vec<&str> = turn.tool_calls.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["call_0", "call_1"]);
    assert_eq!(turn.tool_calls[0].name, "search_offers");
    assert_eq!(turn.tool_calls[1].name, "full_text_search");
}

#[tokio::test]
async fn chat_turn_parses_final_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Three campaigns match." } }]
        })))
        .mount(&server)
        .await;

    let turn = chat_client(&server.uri())
        .chat_turn(&[ChatMessage::user("hi")], &[])
        .await
        .unwrap();

    assert_eq!(turn.text.as_deref(), Some("Three campaigns match."));
    assert!(turn.tool_calls.is_empty());
}

#[tokio::test]
async fn chat_turn_maps_http_error_to_model_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = chat_client(&server.uri())
        .chat_turn(&[ChatMessage::user("hi")], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Model(ref m) if m.contains("429")), "got {err:?}");
}

#[tokio::test]
async fn chat_turn_rejects_empty_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = chat_client(&server.uri())
        .chat_turn(&[ChatMessage::user("hi")], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Model(_)));
}

#[tokio::test]
async fn embed_returns_vector_of_expected_dimension() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "embed-test",
            "input": "travel rewards",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "index": 0, "embedding": vec![0.5_f32; EMBEDDING_DIMENSIONS] }]
        })))
        .mount(&server)
        .await;

    let vector = embedder(&server.uri())
        .embed("travel rewards")
        .await
        .expect("should embed");
    assert_eq!(vector.len(), EMBEDDING_DIMENSIONS);
}

#[tokio::test]
async fn embed_rejects_wrong_dimension() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "embedding": [0.1, 0.2, 0.3] }]
        })))
        .mount(&server)
        .await;

    let err = embedder(&server.uri()).embed("x").await.unwrap_err();
    assert!(matches!(err, AgentError::Embedding(ref m) if m.contains("1536")));
}

#[tokio::test]
async fn embed_maps_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = embedder(&server.uri()).embed("x").await.unwrap_err();
    assert!(matches!(err, AgentError::Embedding(_)));
}
