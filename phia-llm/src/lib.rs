//! Text completion backends for the step controller.

mod google;
mod ollama;

pub use google::{GoogleClient, GoogleClientBuilder, DEFAULT_GEMINI_MODEL, MAX_STOP_SEQUENCES};
pub use ollama::OllamaClient;
pub use phia_core::{GenerateRequest, TextLlm};

use phia_core::PhiaError;

pub(crate) fn provider_error(err: impl std::fmt::Display) -> PhiaError {
    PhiaError::LlmProvider(err.to_string())
}
