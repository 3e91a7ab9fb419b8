use httpmock::prelude::*;
use phia_core::{GenerateRequest, TextLlm};
use phia_llm::OllamaClient;
use serde_json::json;

#[tokio::test]
async fn generate_uses_raw_mode_with_stop_options() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/generate").json_body(json!({
            "model": "llama3.1",
            "prompt": "[Question]: hi\n",
            "raw": true,
            "stream": false,
            "options": {"temperature": 0.0, "stop": ["[Observe]"]}
        }));
        then.status(200).json_body(json!({
            "model": "llama3.1",
            "response": "[Finish]: hello",
            "done": true
        }));
    });

    let client = OllamaClient::new(server.url("/"), "llama3.1").unwrap();
    let text = client
        .generate(GenerateRequest::new(
            "[Question]: hi\n",
            vec!["[Observe]".to_string()],
        ))
        .await
        .unwrap();
    assert_eq!(text, "[Finish]: hello");
    mock.assert();
}

#[tokio::test]
async fn server_error_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(404).body("model not found");
    });

    let client = OllamaClient::new(server.url(""), "missing").unwrap();
    let result = client.generate(GenerateRequest::new("p", vec![])).await;
    assert!(result.is_err());
}
