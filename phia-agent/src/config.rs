use serde::{Deserialize, Serialize};

use crate::AgentError;

pub const DEFAULT_MAX_STEPS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Appended steps allowed before the controller forces a final answer.
    pub max_steps: usize,
    /// Prepended to every question before it becomes the trajectory input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_prefix: Option<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            question_prefix: None,
        }
    }
}

impl ControllerConfig {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_question_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.question_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.max_steps == 0 {
            return Err(AgentError::Config(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn question_input(&self, question: &str) -> String {
        match &self.question_prefix {
            Some(prefix) => format!("{prefix}{question}"),
            None => question.to_string(),
        }
    }
}
