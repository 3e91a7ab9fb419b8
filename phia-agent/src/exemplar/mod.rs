//! Compiles worked-example notebooks into exemplar trajectories.
//!
//! A notebook's first cell is the problem statement. Each following
//! markdown-then-code pair becomes one step: the markdown is the thought, the
//! code is the action, and the code cell's recorded output is the observation.

mod classifier;
mod compiler;
mod finish;
pub mod notebook;

pub use classifier::{KeywordClassifier, ToolClassifier};
pub use compiler::{
    load_exemplar_dir, load_exemplar_files, CompiledExemplar, ExemplarCompiler, FinishOrigin,
    SourceDocument, ToolNames,
};
pub use finish::extract_printed_answer;
