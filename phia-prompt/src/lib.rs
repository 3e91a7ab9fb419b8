mod preamble;
mod render;

pub use preamble::{DEFAULT_PREAMBLE, DEFAULT_QUESTION_PREFIX};
pub use render::{
    default_stop_markers, PromptRenderer, PromptRendererBuilder, RenderedPrompt, ACT_LABEL,
    FINISH_LABEL, OBSERVE_LABEL, QUESTION_LABEL, THOUGHT_LABEL,
};
