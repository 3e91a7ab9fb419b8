//! ReAct step controller, model-output parsing and exemplar compilation.

mod config;
mod controller;
mod error;
mod event;
pub mod exemplar;
mod parse;

pub use config::{ControllerConfig, DEFAULT_MAX_STEPS};
pub use controller::{AgentOutcome, ControllerState, StepController, StepControllerBuilder};
pub use error::{AgentError, ExemplarError};
pub use event::AgentEvent;
pub use exemplar::{
    load_exemplar_dir, load_exemplar_files, CompiledExemplar, ExemplarCompiler, FinishOrigin,
    KeywordClassifier, SourceDocument, ToolClassifier, ToolNames,
};
pub use parse::{parse_action, parse_model_output, ActionParseError, ModelTurn};
