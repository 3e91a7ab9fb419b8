use std::sync::Arc;

use async_trait::async_trait;
use phia_core::{Tool, ToolError, ToolInput, ToolKind};

/// Where the `search` tool sends its queries.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn description(&self) -> &str;

    async fn search(&self, query: &str) -> Result<String, ToolError>;
}

#[derive(Clone)]
pub struct SearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl std::fmt::Debug for SearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchTool")
            .field("backend", &self.backend.description())
            .finish()
    }
}

impl SearchTool {
    pub fn new(backend: impl SearchBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn mock() -> Self {
        Self::new(MockSearch)
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        self.backend.description()
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Search
    }

    async fn invoke(&self, input: &ToolInput) -> Result<String, ToolError> {
        let query = input
            .first_arg()
            .or_else(|| input.kwargs.get("query").map(String::as_str))
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .ok_or_else(|| ToolError::InvalidInput("search expects a query".to_string()))?;
        self.backend.search(query).await
    }
}

/// Stand-in used when no search API key is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockSearch;

#[async_trait]
impl SearchBackend for MockSearch {
    fn description(&self) -> &str {
        "Mock search engine."
    }

    async fn search(&self, _query: &str) -> Result<String, ToolError> {
        Ok("Web search is not available in mock mode.".to_string())
    }
}

#[cfg(feature = "search")]
pub use tavily::TavilySearch;

#[cfg(feature = "search")]
mod tavily {
    use std::time::Duration;

    use async_trait::async_trait;
    use phia_core::ToolError;
    use reqwest::{Client, StatusCode};
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Serialize};

    use super::SearchBackend;

    const TAVILY_BASE_URL: &str = "https://api.tavily.com";
    const EXCERPT_CHARS: usize = 200;

    /// Tavily web search tuned for health and wellness lookups.
    #[derive(Clone)]
    pub struct TavilySearch {
        api_key: SecretString,
        base_url: String,
        max_results: u32,
        http: Client,
    }

    impl std::fmt::Debug for TavilySearch {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TavilySearch")
                .field("api_key", &"[REDACTED]")
                .field("base_url", &self.base_url)
                .field("max_results", &self.max_results)
                .finish()
        }
    }

    impl TavilySearch {
        pub fn new(api_key: impl Into<String>) -> Result<Self, ToolError> {
            let api_key = api_key.into();
            if api_key.trim().is_empty() {
                return Err(ToolError::InvalidInput(
                    "Tavily API key must not be empty".to_string(),
                ));
            }
            let http = Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|err| ToolError::ExecutionFailed(err.to_string()))?;
            Ok(Self {
                api_key: SecretString::new(api_key),
                base_url: TAVILY_BASE_URL.to_string(),
                max_results: 5,
                http,
            })
        }

        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into();
            self
        }

        pub fn with_max_results(mut self, max_results: u32) -> Self {
            self.max_results = max_results;
            self
        }
    }

    #[derive(Debug, Serialize)]
    struct TavilySearchRequest<'a> {
        api_key: &'a str,
        query: &'a str,
        max_results: u32,
        search_depth: &'static str,
        include_answer: bool,
        include_raw_content: bool,
    }

    #[derive(Debug, Deserialize)]
    struct TavilySearchResponse {
        #[serde(default)]
        answer: Option<String>,
        #[serde(default)]
        results: Vec<TavilyResult>,
    }

    #[derive(Debug, Deserialize)]
    struct TavilyResult {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        score: Option<f64>,
    }

    #[async_trait]
    impl SearchBackend for TavilySearch {
        fn description(&self) -> &str {
            "Web search engine for finding health, wellness, and fitness information. Returns relevant articles and summaries."
        }

        async fn search(&self, query: &str) -> Result<String, ToolError> {
            let request = TavilySearchRequest {
                api_key: self.api_key.expose_secret(),
                query,
                max_results: self.max_results,
                search_depth: "advanced",
                include_answer: false,
                include_raw_content: false,
            };

            tracing::debug!(query, "executing Tavily search");
            let url = format!("{}/search", self.base_url.trim_end_matches('/'));
            let response = self
                .http
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|err| ToolError::ExecutionFailed(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = match status {
                    StatusCode::UNAUTHORIZED => "invalid Tavily API key".to_string(),
                    StatusCode::TOO_MANY_REQUESTS => "Tavily rate limit exceeded".to_string(),
                    _ => format!("Tavily API error {status}: {body}"),
                };
                return Err(ToolError::ExecutionFailed(message));
            }

            let response: TavilySearchResponse = response.json().await.map_err(|err| {
                ToolError::ExecutionFailed(format!("failed to parse Tavily response: {err}"))
            })?;
            Ok(format_results(&response))
        }
    }

    fn format_results(response: &TavilySearchResponse) -> String {
        let mut lines = Vec::new();
        if let Some(answer) = response.answer.as_deref().filter(|a| !a.is_empty()) {
            lines.push(format!("Summary: {answer}\n"));
        }
        if !response.results.is_empty() {
            lines.push("Search Results:".to_string());
            for (i, result) in response.results.iter().enumerate() {
                let content = result
                    .content
                    .as_deref()
                    .unwrap_or("No content available");
                let excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
                lines.push(format!(
                    "\n{}. {}",
                    i + 1,
                    result.title.as_deref().unwrap_or("No title")
                ));
                lines.push(format!(
                    "   URL: {}",
                    result.url.as_deref().unwrap_or("No URL")
                ));
                lines.push(format!("   Content: {excerpt}..."));
                if let Some(score) = result.score.filter(|score| *score != 0.0) {
                    lines.push(format!("   Relevance Score: {score:.2}"));
                }
            }
        }

        if lines.is_empty() {
            "No search results found.".to_string()
        } else {
            lines.join("\n")
        }
    }
}
