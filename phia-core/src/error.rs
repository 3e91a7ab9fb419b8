use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhiaError {
    #[error("LLM provider failed: {0}")]
    LlmProvider(String),
    #[error("Parsing failed on output '{output}': {reason}")]
    ParseFailed { output: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Trajectory already finished; no further steps may be appended")]
    TrajectoryClosed,
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}
