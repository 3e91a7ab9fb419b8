mod error;
mod llm;
mod tool;
mod trajectory;

pub use error::PhiaError;
pub use llm::{truncate_at_stop, GenerateRequest, TextLlm};
pub use tool::{
    Tool, ToolDescription, ToolDispatchError, ToolError, ToolInput, ToolKind, ToolRegistry,
    ToolRegistryError,
};
pub use trajectory::{python_repr, Action, ArgumentFormat, Step, Trajectory};
