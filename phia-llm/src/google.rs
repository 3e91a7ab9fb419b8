//! Google Gemini `generateContent` backend.

use std::time::Duration;

use phia_core::{GenerateRequest, PhiaError, TextLlm};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::provider_error;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
/// Gemini rejects requests carrying more stop sequences than this.
pub const MAX_STOP_SEQUENCES: usize = 5;

#[derive(Clone)]
pub struct GoogleClient {
    base_url: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
    http: Client,
}

impl std::fmt::Debug for GoogleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GoogleClient {
    pub fn builder() -> GoogleClientBuilder {
        GoogleClientBuilder::default()
    }

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, PhiaError> {
        Self::builder().api_key(api_key).model(model).build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        let model = self.model.trim();
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model.strip_prefix("models/").unwrap_or(model)
        )
    }
}

pub struct GoogleClientBuilder {
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl Default for GoogleClientBuilder {
    fn default() -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(120),
        }
    }
}

impl std::fmt::Debug for GoogleClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleClientBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GoogleClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GoogleClient, PhiaError> {
        let api_key = self
            .api_key
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| PhiaError::InvalidConfig("Gemini API key is required".to_string()))?;
        if self.model.trim().is_empty() {
            return Err(PhiaError::InvalidConfig(
                "Gemini model name is required".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(provider_error)?;
        Ok(GoogleClient {
            base_url: self.base_url,
            api_key,
            model: self.model,
            temperature: self.temperature,
            http,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

fn build_request(request: GenerateRequest, temperature: f32) -> GenerateContentRequest {
    let mut stop = request.stop;
    if stop.len() > MAX_STOP_SEQUENCES {
        tracing::warn!(
            requested = stop.len(),
            kept = MAX_STOP_SEQUENCES,
            "dropping stop sequences Gemini cannot accept"
        );
        stop.truncate(MAX_STOP_SEQUENCES);
    }
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(request.prompt),
            }],
        }],
        generation_config: GenerationConfig {
            temperature,
            stop_sequences: stop,
        },
    }
}

#[async_trait::async_trait]
impl TextLlm for GoogleClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, PhiaError> {
        let body = build_request(request, self.temperature);
        tracing::debug!(model = %self.model, "sending Gemini generateContent request");

        let response = self
            .http
            .post(self.generate_url())
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .json(&body)
            .send()
            .await
            .map_err(provider_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));
            return Err(PhiaError::LlmProvider(message));
        }

        let response = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(provider_error)?;

        let candidate = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| PhiaError::LlmProvider("No candidates in response".to_string()))?;

        let Some(content) = candidate.content else {
            return Err(PhiaError::LlmProvider(format!(
                "candidate has no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        };

        Ok(content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<String>())
    }
}
