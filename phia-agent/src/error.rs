use std::path::PathBuf;

use phia_core::PhiaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model backend failed: {0}")]
    Model(#[source] PhiaError),
    #[error("invalid controller configuration: {0}")]
    Config(String),
    #[error("trajectory rejected step: {0}")]
    Trajectory(#[source] PhiaError),
}

/// Why an exemplar document was skipped.
#[derive(Debug, Error)]
pub enum ExemplarError {
    #[error("failed to read exemplar {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("exemplar '{name}' is not a valid notebook: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("exemplar '{name}' has no cells")]
    EmptyNotebook { name: String },
}
