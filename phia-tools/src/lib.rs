//! Tools the step controller can dispatch: Python execution, web search and
//! the finish tool that ends a run.

mod finish;
#[cfg(feature = "exec")]
mod python;
mod search;

pub use finish::FinishTool;
#[cfg(feature = "exec")]
pub use python::{truncate_output, PythonTool, MAX_OUTPUT_SIZE};
#[cfg(feature = "search")]
pub use search::TavilySearch;
pub use search::{MockSearch, SearchBackend, SearchTool};
