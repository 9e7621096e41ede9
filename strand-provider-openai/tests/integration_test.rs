use serde_json::json;
use strand_core::{LlmProvider, Message};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn chat_text_response_decodes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop",
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11},
        })))
        .mount(&server)
        .await;

    let provider = strand_provider_openai::OpenAiChatProvider::new(
        "test-key",
        "gpt-4o",
        Some(&server.uri()),
    );
    let result = provider
        .generate(&[Message::user("Hi")], &[])
        .await
        .unwrap();

    assert_eq!(result.content.as_deref(), Some("Hello!"));
    assert_eq!(result.finish_reason.as_deref(), Some("stop"));
    assert_eq!(result.usage.unwrap().total_tokens, 11);
}

#[tokio::test]
async fn chat_tool_calls_decode_with_parsed_arguments() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-2",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "lookup", "arguments": "{\"q\":\"rust\"}"},
                    }],
                },
                "finish_reason": "tool_calls",
            }],
        })))
        .mount(&server)
        .await;

    let provider = strand_provider_openai::OpenAiChatProvider::new(
        "test-key",
        "gpt-4o",
        Some(&server.uri()),
    );
    let result = provider
        .generate(&[Message::user("look up rust")], &[])
        .await
        .unwrap();

    let calls = result.tool_calls.unwrap();
    assert_eq!(calls[0].call_id, "call_abc");
    assert_eq!(calls[0].function.arguments["q"], "rust");
}

#[tokio::test]
async fn responses_system_message_lands_in_instructions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "status": "completed",
            "output": [{
                "type": "message", "role": "assistant",
                "content": [{"type": "output_text", "text": "ok"}],
            }],
        })))
        .mount(&server)
        .await;

    let provider = strand_provider_openai::OpenAiResponsesProvider::new(
        "test-key",
        "gpt-4o",
        Some(&server.uri()),
    );
    let result = provider
        .generate(
            &[Message::system("be terse"), Message::user("hi")],
            &[],
        )
        .await
        .unwrap();
    assert_eq!(result.content.as_deref(), Some("ok"));
    assert_eq!(result.finish_reason.as_deref(), Some("stop"));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["instructions"], "be terse");
    assert_eq!(body["input"][0]["role"], "user");
}

#[tokio::test]
async fn responses_reasoning_and_calls_decode() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_2",
            "status": "completed",
            "output": [
                {"type": "reasoning", "id": "rs_1",
                 "summary": [{"type": "summary_text", "text": "need the tool"}]},
                {"type": "function_call", "id": "fc_1", "call_id": "call_1",
                 "name": "lookup", "arguments": "{\"q\":1}"},
            ],
            "usage": {"input_tokens": 5, "output_tokens": 4, "total_tokens": 9},
        })))
        .mount(&server)
        .await;

    let provider = strand_provider_openai::OpenAiResponsesProvider::new(
        "test-key",
        "gpt-4o",
        Some(&server.uri()),
    );
    let result = provider
        .generate(&[Message::user("go")], &[])
        .await
        .unwrap();

    assert_eq!(result.thinking.as_deref(), Some("need the tool"));
    assert_eq!(result.reasoning_items.unwrap()[0].id, "rs_1");
    let calls = result.tool_calls.unwrap();
    assert_eq!(calls[0].id.as_deref(), Some("fc_1"));
    assert_eq!(calls[0].call_id, "call_1");
}

#[tokio::test]
async fn http_error_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider = strand_provider_openai::OpenAiChatProvider::new(
        "test-key",
        "gpt-4o",
        Some(&server.uri()),
    );
    let err = provider
        .generate(&[Message::user("Hi")], &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("429"));
}
