use httpmock::prelude::*;
use phia_core::{GenerateRequest, PhiaError, TextLlm};
use phia_llm::GoogleClient;
use serde_json::json;

fn client(server: &MockServer) -> GoogleClient {
    GoogleClient::builder()
        .api_key("test-key")
        .model("gemini-1.5-pro")
        .base_url(server.url(""))
        .build()
        .unwrap()
}

#[tokio::test]
async fn generate_sends_prompt_and_stop_sequences() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-pro:generateContent")
            .query_param("key", "test-key")
            .json_body(json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "[Question]: hi\n"}]}
                ],
                "generationConfig": {
                    "temperature": 0.0,
                    "stopSequences": ["[Observe]", "[Question]"]
                }
            }));
        then.status(200).json_body(json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{"text": "[Thought]: Say hello.\n"}, {"text": "[Finish]: hello"}]
                    },
                    "finishReason": "STOP"
                }
            ]
        }));
    });

    let request = GenerateRequest::new(
        "[Question]: hi\n",
        vec!["[Observe]".to_string(), "[Question]".to_string()],
    );
    let text = client(&server).generate(request).await.unwrap();
    assert_eq!(text, "[Thought]: Say hello.\n[Finish]: hello");
    mock.assert();
}

#[tokio::test]
async fn generate_caps_stop_sequences() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-pro:generateContent")
            .json_body(json!({
                "contents": [{"role": "user", "parts": [{"text": "p"}]}],
                "generationConfig": {
                    "temperature": 0.0,
                    "stopSequences": ["a", "b", "c", "d", "e"]
                }
            }));
        then.status(200).json_body(json!({
            "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
        }));
    });

    let stop = ["a", "b", "c", "d", "e", "f", "g"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let text = client(&server)
        .generate(GenerateRequest::new("p", stop))
        .await
        .unwrap();
    assert_eq!(text, "ok");
    mock.assert();
}

#[tokio::test]
async fn generate_surfaces_api_error_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-pro:generateContent");
        then.status(400).json_body(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        }));
    });

    let err = client(&server)
        .generate(GenerateRequest::new("p", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, PhiaError::LlmProvider(ref msg) if msg == "API key not valid."));
}

#[tokio::test]
async fn blocked_candidate_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-pro:generateContent");
        then.status(200).json_body(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }));
    });

    let err = client(&server)
        .generate(GenerateRequest::new("p", vec![]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
}

#[test]
fn builder_requires_key_and_redacts_it() {
    let err = GoogleClient::builder().build().unwrap_err();
    assert!(matches!(err, PhiaError::InvalidConfig(_)));

    let err = GoogleClient::new("   ", "gemini-1.5-pro").unwrap_err();
    assert!(matches!(err, PhiaError::InvalidConfig(_)));

    let builder = GoogleClient::builder().api_key("super-secret");
    assert!(!format!("{builder:?}").contains("super-secret"));

    let client = GoogleClient::new("super-secret", "models/gemini-1.5-flash").unwrap();
    let debug = format!("{client:?}");
    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("[REDACTED]"));
    assert_eq!(client.model(), "models/gemini-1.5-flash");
}
