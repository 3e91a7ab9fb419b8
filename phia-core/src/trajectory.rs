//! One reasoning episode: a question plus the causally ordered steps taken
//! toward answering it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::PhiaError;

/// How an action's arguments are written into the prompt.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentFormat {
    /// `name('arg', key='value')`
    #[default]
    Python,
    /// A fenced block tagged with the tool name, keeping multi-line code readable.
    Markdown,
    /// Raw model text that could not be parsed into a call.
    Verbatim,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Action {
    pub tool_name: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kwargs: BTreeMap<String, String>,
    #[serde(default)]
    pub format: ArgumentFormat,
}

impl Action {
    pub fn new(tool_name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            args,
            kwargs: BTreeMap::new(),
            format: ArgumentFormat::Python,
        }
    }

    /// A single code argument rendered as a fenced block.
    pub fn code(tool_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            args: vec![code.into()],
            kwargs: BTreeMap::new(),
            format: ArgumentFormat::Markdown,
        }
    }

    pub fn verbatim(raw: impl Into<String>) -> Self {
        Self {
            tool_name: String::new(),
            args: vec![raw.into()],
            kwargs: BTreeMap::new(),
            format: ArgumentFormat::Verbatim,
        }
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn render(&self) -> String {
        match self.format {
            ArgumentFormat::Markdown => format!(
                "```{}\n{}\n```",
                self.tool_name,
                self.args.join("\n")
            ),
            ArgumentFormat::Verbatim => self.args.join("\n"),
            ArgumentFormat::Python => {
                let mut parts: Vec<String> = self.args.iter().map(|arg| python_repr(arg)).collect();
                parts.extend(
                    self.kwargs
                        .iter()
                        .map(|(key, value)| format!("{key}={}", python_repr(value))),
                );
                format!("{}({})", self.tool_name, parts.join(", "))
            }
        }
    }
}

/// Quotes `value` the way Python's `repr` quotes a `str`.
pub fn python_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    #[serde(default)]
    pub is_finished: bool,
}

impl Step {
    pub fn new(thought: Option<String>, action: Action, observation: Option<String>) -> Self {
        Self {
            thought: non_empty(thought),
            action: Some(action),
            observation: non_empty(observation),
            is_finished: false,
        }
    }

    pub fn finish(thought: Option<String>, action: Action, answer: impl Into<String>) -> Self {
        Self {
            thought: non_empty(thought),
            action: Some(action),
            observation: non_empty(Some(answer.into())),
            is_finished: true,
        }
    }

    /// A thought with no action, left for a forced finish to resolve.
    pub fn dangling(thought: impl Into<String>) -> Self {
        Self {
            thought: non_empty(Some(thought.into())),
            ..Self::default()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Trajectory {
    pub input: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Trajectory {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_steps(input: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            input: input.into(),
            steps,
        }
    }

    pub fn push(&mut self, step: Step) -> Result<(), PhiaError> {
        if self.is_finished() {
            return Err(PhiaError::TrajectoryClosed);
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn is_finished(&self) -> bool {
        self.steps.last().is_some_and(|step| step.is_finished)
    }
}
