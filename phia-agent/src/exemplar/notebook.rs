//! The subset of the Jupyter nbformat v4 layout the compiler reads.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    #[serde(default)]
    pub source: MultilineText,
    #[serde(default)]
    pub outputs: Vec<CellOutput>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Markdown,
    Code,
    Raw,
    #[serde(other)]
    Unknown,
}

/// nbformat stores text either as one string or as a list of lines.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MultilineText {
    Single(String),
    Lines(Vec<String>),
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::Single(String::new())
    }
}

impl MultilineText {
    pub fn joined(&self) -> String {
        match self {
            MultilineText::Single(text) => text.clone(),
            MultilineText::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CellOutput {
    #[serde(default)]
    pub text: Option<MultilineText>,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
}

impl CellOutput {
    /// Stream text first, otherwise the `text/plain` rendering.
    pub fn plain_text(&self) -> Option<String> {
        if let Some(text) = &self.text {
            return Some(text.joined());
        }
        let plain = self.data.get("text/plain")?;
        serde_json::from_value::<MultilineText>(plain.clone())
            .ok()
            .map(|text| text.joined())
    }
}

impl Cell {
    pub fn text(&self) -> String {
        self.source.joined()
    }

    pub fn recorded_output(&self) -> Option<String> {
        self.outputs.first().and_then(CellOutput::plain_text)
    }
}
