use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::PhiaError;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, stop: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            stop,
        }
    }
}

/// Plain text completion. Backends may overshoot the stop markers; callers
/// re-truncate with [`truncate_at_stop`].
#[async_trait::async_trait]
pub trait TextLlm: Send + Sync + 'static {
    async fn generate(&self, request: GenerateRequest) -> Result<String, PhiaError>;
}

#[async_trait::async_trait]
impl<T> TextLlm for Arc<T>
where
    T: TextLlm + ?Sized,
{
    async fn generate(&self, request: GenerateRequest) -> Result<String, PhiaError> {
        (**self).generate(request).await
    }
}

/// Cuts `text` at the earliest occurrence of any stop marker.
pub fn truncate_at_stop<'a>(text: &'a str, stop: &[String]) -> &'a str {
    let cut = stop
        .iter()
        .filter(|marker| !marker.is_empty())
        .filter_map(|marker| text.find(marker.as_str()))
        .min()
        .unwrap_or(text.len());
    &text[..cut]
}
