use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Action;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a tool does, as far as the controller and exemplar compiler care.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Code,
    Search,
    Finish,
    Other,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolInput {
    pub args: Vec<String>,
    pub kwargs: BTreeMap<String, String>,
}

impl ToolInput {
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl From<&Action> for ToolInput {
    fn from(action: &Action) -> Self {
        Self {
            args: action.args.clone(),
            kwargs: action.kwargs.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn kind(&self) -> ToolKind;

    fn example(&self) -> Option<&str> {
        None
    }

    async fn invoke(&self, input: &ToolInput) -> Result<String, ToolError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub example: Option<String>,
}

#[derive(Debug, Error)]
pub enum ToolDispatchError {
    #[error("tool not found: {name}")]
    UnknownTool { name: String },
    #[error("tool '{name}' failed: {source}")]
    Execution {
        name: String,
        #[source]
        source: ToolError,
    },
    #[error("tool '{name}' panicked: {message}")]
    Panicked { name: String, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ToolRegistryError {
    #[error("tool name must not be empty or whitespace: {name:?}")]
    InvalidName { name: String },
    #[error("duplicate tool name: {name}")]
    DuplicateName { name: String },
}

/// Tools available to one controller instance, kept in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolRegistryError> {
        let name = tool.name().to_string();
        if name.trim().is_empty() {
            return Err(ToolRegistryError::InvalidName { name });
        }
        if self.tools.contains_key(&name) {
            return Err(ToolRegistryError::DuplicateName { name });
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, ToolRegistryError> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn Tool>, ToolDispatchError> {
        self.tools
            .get(name)
            .ok_or_else(|| ToolDispatchError::UnknownTool {
                name: name.to_string(),
            })
    }

    pub fn first_of_kind(&self, kind: ToolKind) -> Option<&Arc<dyn Tool>> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .find(|tool| tool.kind() == kind)
    }

    pub fn describe_all(&self) -> Vec<ToolDescription> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolDescription {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                example: tool.example().map(str::to_string),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Runs the action's tool. Failures, including panics inside the tool,
    /// come back as errors and never unwind into the caller.
    pub async fn dispatch(&self, action: &Action) -> Result<String, ToolDispatchError> {
        let tool = self.lookup(&action.tool_name)?;
        let input = ToolInput::from(action);
        match AssertUnwindSafe(tool.invoke(&input)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(ToolDispatchError::Execution {
                name: action.tool_name.clone(),
                source,
            }),
            Err(payload) => Err(ToolDispatchError::Panicked {
                name: action.tool_name.clone(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
