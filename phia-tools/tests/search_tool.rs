use httpmock::prelude::*;
use phia_core::{Tool, ToolError, ToolInput, ToolKind};
use phia_tools::{SearchTool, TavilySearch};
use serde_json::json;

fn query(text: &str) -> ToolInput {
    ToolInput {
        args: vec![text.to_string()],
        ..ToolInput::default()
    }
}

fn tavily(server: &MockServer) -> SearchTool {
    SearchTool::new(
        TavilySearch::new("tvly-test")
            .unwrap()
            .with_base_url(server.url("")),
    )
}

#[tokio::test]
async fn tavily_results_are_numbered_with_excerpts() {
    let server = MockServer::start();
    let long_content = "x".repeat(300);
    let mock = server.mock(|when, then| {
        when.method(POST).path("/search").json_body(json!({
            "api_key": "tvly-test",
            "query": "recommended sleep for adults",
            "max_results": 5,
            "search_depth": "advanced",
            "include_answer": false,
            "include_raw_content": false
        }));
        then.status(200).json_body(json!({
            "query": "recommended sleep for adults",
            "results": [
                {
                    "title": "How much sleep do adults need?",
                    "url": "https://example.org/sleep",
                    "content": "Adults need 7 or more hours per night.",
                    "score": 0.9134
                },
                {
                    "title": "Sleep hygiene",
                    "url": "https://example.org/hygiene",
                    "content": long_content,
                    "score": 0.5
                }
            ]
        }));
    });

    let output = tavily(&server)
        .invoke(&query("recommended sleep for adults"))
        .await
        .unwrap();
    mock.assert();

    let expected_first = "Search Results:\n\n1. How much sleep do adults need?\n   URL: https://example.org/sleep\n   Content: Adults need 7 or more hours per night....\n   Relevance Score: 0.91";
    assert!(output.starts_with(expected_first));
    assert!(output.contains(&format!("   Content: {}...\n", "x".repeat(200))));
    assert!(output.ends_with("   Relevance Score: 0.50"));
}

#[tokio::test]
async fn empty_result_set_has_a_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/search");
        then.status(200).json_body(json!({"results": []}));
    });

    let output = tavily(&server).invoke(&query("nothing")).await.unwrap();
    assert_eq!(output, "No search results found.");
}

#[tokio::test]
async fn unauthorized_is_an_execution_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/search");
        then.status(401).json_body(json!({"detail": {"error": "Unauthorized"}}));
    });

    let err = tavily(&server).invoke(&query("steps")).await.unwrap_err();
    assert!(matches!(err, ToolError::ExecutionFailed(ref msg) if msg.contains("API key")));
}

#[tokio::test]
async fn mock_search_never_touches_the_network() {
    let tool = SearchTool::mock();
    assert_eq!(tool.name(), "search");
    assert_eq!(tool.kind(), ToolKind::Search);
    assert_eq!(tool.description(), "Mock search engine.");
    assert_eq!(
        tool.invoke(&query("anything")).await.unwrap(),
        "Web search is not available in mock mode."
    );
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let err = SearchTool::mock().invoke(&query("  ")).await.unwrap_err();
    assert!(matches!(err, ToolError::InvalidInput(_)));
}

#[test]
fn tavily_key_is_required_and_redacted() {
    assert!(TavilySearch::new("").is_err());
    let backend = TavilySearch::new("tvly-secret").unwrap();
    assert!(!format!("{backend:?}").contains("tvly-secret"));
}
