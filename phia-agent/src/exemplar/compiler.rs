use std::path::{Path, PathBuf};

use phia_core::{Action, Step, ToolKind, Trajectory};

use super::classifier::{KeywordClassifier, ToolClassifier};
use super::finish::extract_printed_answer;
use super::notebook::{Cell, CellType, Notebook};
use crate::ExemplarError;

const TEST_MARKER: &str = "# @test {\"skip\": true}\n";

/// Raw exemplar text plus a name used in logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub contents: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// How a compiled exemplar came to end (or not) with a finish step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishOrigin {
    Explicit,
    Synthesized,
    Absent,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledExemplar {
    pub name: String,
    pub trajectory: Trajectory,
    pub finish: FinishOrigin,
    pub skipped_pairs: usize,
}

/// Tool names written into compiled actions, per kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolNames {
    pub code: String,
    pub search: String,
    pub finish: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            code: "tool_code".to_string(),
            search: "search".to_string(),
            finish: "finish".to_string(),
        }
    }
}

impl ToolNames {
    pub fn name_for(&self, kind: ToolKind) -> Option<&str> {
        match kind {
            ToolKind::Code => Some(&self.code),
            ToolKind::Search => Some(&self.search),
            ToolKind::Finish => Some(&self.finish),
            ToolKind::Other => None,
        }
    }
}

pub struct ExemplarCompiler {
    classifier: Box<dyn ToolClassifier>,
    names: ToolNames,
}

impl Default for ExemplarCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExemplarCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExemplarCompiler")
            .field("names", &self.names)
            .finish()
    }
}

impl ExemplarCompiler {
    pub fn new() -> Self {
        Self {
            classifier: Box::new(KeywordClassifier::default()),
            names: ToolNames::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl ToolClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_tool_names(mut self, names: ToolNames) -> Self {
        self.names = names;
        self
    }

    /// Compiles every document, logging and skipping the ones that fail.
    pub fn compile_all(&self, documents: &[SourceDocument]) -> Vec<CompiledExemplar> {
        documents
            .iter()
            .filter_map(|document| match self.compile_document(document) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    tracing::warn!(exemplar = %document.name, error = %err, "skipping exemplar");
                    None
                }
            })
            .collect()
    }

    pub fn compile_document(
        &self,
        document: &SourceDocument,
    ) -> Result<CompiledExemplar, ExemplarError> {
        let notebook: Notebook =
            serde_json::from_str(&document.contents).map_err(|source| ExemplarError::Json {
                name: document.name.clone(),
                source,
            })?;
        self.compile_notebook(&document.name, &notebook)
    }

    pub fn compile_notebook(
        &self,
        name: &str,
        notebook: &Notebook,
    ) -> Result<CompiledExemplar, ExemplarError> {
        let Some((statement, cells)) = notebook.cells.split_first() else {
            return Err(ExemplarError::EmptyNotebook {
                name: name.to_string(),
            });
        };
        let input = statement
            .text()
            .trim()
            .trim_start_matches('#')
            .trim()
            .to_string();

        let mut steps = Vec::new();
        let mut skipped_pairs = 0;
        let mut i = 0;
        while i < cells.len() {
            let pair = (cells.get(i), cells.get(i + 1));
            let (Some(explanation), Some(code)) = pair else {
                i += 1;
                continue;
            };
            if explanation.cell_type != CellType::Markdown || code.cell_type != CellType::Code {
                i += 1;
                continue;
            }
            i += 2;

            match self.compile_pair(explanation, code) {
                Some(step) => {
                    let finished = step.is_finished;
                    steps.push(step);
                    if finished {
                        if i < cells.len() {
                            tracing::debug!(
                                exemplar = %name,
                                ignored_cells = cells.len() - i,
                                "cells after an explicit finish are ignored"
                            );
                        }
                        break;
                    }
                }
                None => {
                    skipped_pairs += 1;
                    tracing::warn!(exemplar = %name, cell = i, "skipping malformed exemplar pair");
                }
            }
        }

        let finish = self.finalize(name, &mut steps);
        Ok(CompiledExemplar {
            name: name.to_string(),
            trajectory: Trajectory::with_steps(input, steps),
            finish,
            skipped_pairs,
        })
    }

    fn compile_pair(&self, explanation: &Cell, code_cell: &Cell) -> Option<Step> {
        let thought = explanation.text().trim().to_string();
        let code = code_cell.text().trim().replace(TEST_MARKER, "");
        let observation = code_cell
            .recorded_output()
            .map(|text| text.trim().to_string());

        let kind = self.classifier.classify(&code);
        let tool_name = self.names.name_for(kind)?;
        let step = match kind {
            ToolKind::Search => {
                let query = code.split('\'').nth(1)?;
                Step::new(
                    Some(thought),
                    Action::new(tool_name, vec![query.to_string()]),
                    observation,
                )
            }
            ToolKind::Code => Step::new(Some(thought), Action::code(tool_name, code), observation),
            ToolKind::Finish => {
                let answer = observation.unwrap_or_else(|| code.clone());
                Step::finish(Some(thought), Action::new(tool_name, vec![code]), answer)
            }
            ToolKind::Other => return None,
        };
        Some(step)
    }

    fn finalize(&self, name: &str, steps: &mut [Step]) -> FinishOrigin {
        let Some(last) = steps.last_mut() else {
            return FinishOrigin::Absent;
        };
        if last.is_finished {
            return FinishOrigin::Explicit;
        }
        let Some(action) = &last.action else {
            return FinishOrigin::Absent;
        };
        if action.tool_name != self.names.code {
            return FinishOrigin::Absent;
        }
        let Some(answer) = action.first_arg().and_then(extract_printed_answer) else {
            return FinishOrigin::Absent;
        };

        tracing::debug!(exemplar = %name, "synthesized finish step from printed output");
        *last = Step::finish(
            last.thought.take(),
            Action::new(self.names.finish.clone(), vec![answer.clone()]),
            answer,
        );
        FinishOrigin::Synthesized
    }
}

/// Reads exemplar files, logging and skipping those that cannot be read.
pub fn load_exemplar_files<P: AsRef<Path>>(paths: &[P]) -> Vec<SourceDocument> {
    paths
        .iter()
        .filter_map(|path| {
            let path = path.as_ref();
            match std::fs::read_to_string(path) {
                Ok(contents) => Some(SourceDocument::new(path.display().to_string(), contents)),
                Err(source) => {
                    let err = ExemplarError::Io {
                        path: path.to_path_buf(),
                        source,
                    };
                    tracing::warn!(error = %err, "skipping exemplar");
                    None
                }
            }
        })
        .collect()
}

/// Every `*.ipynb` file in `dir`, in path order.
pub fn load_exemplar_dir(dir: impl AsRef<Path>) -> Result<Vec<SourceDocument>, ExemplarError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|source| ExemplarError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ipynb"))
        .collect();
    paths.sort();
    Ok(load_exemplar_files(&paths))
}
