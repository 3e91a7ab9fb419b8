use std::time::Duration;

use phia_core::{GenerateRequest, PhiaError, TextLlm};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::provider_error;

/// Local Ollama server, prompted through `/api/generate` in raw mode so the
/// rendered prompt reaches the model without a chat template around it.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f32,
    http: Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, PhiaError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(provider_error)?;
        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            temperature: 0.0,
            http,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    raw: bool,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[async_trait::async_trait]
impl TextLlm for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, PhiaError> {
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: request.prompt,
            raw: true,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                stop: request.stop,
            },
        };

        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let response: OllamaGenerateResponse = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(provider_error)?
            .error_for_status()
            .map_err(provider_error)?
            .json()
            .await
            .map_err(provider_error)?;

        Ok(response.response)
    }
}
