//! Core domain types: notebooks, cells, and import jobs.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Marker token replaced by a job's source URL in every cell line.
pub const URL_PLACEHOLDER: &str = "%URL%";

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// One notebook cell, tagged by its `cell_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    /// Markdown text.
    Markdown(TextCell),
    /// Executable code plus its (discarded) execution state.
    Code(CodeCell),
    /// Raw, unrendered text.
    Raw(TextCell),
}

/// Body of a non-code cell: only metadata and source lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextCell {
    /// Free-form cell metadata, passed through untouched.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Source lines, each normally ending with `\n` except the last.
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Vec<String>,
}

/// Body of a code cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeCell {
    /// Execution counter; `None` serializes as `null` ("not yet executed").
    #[serde(default)]
    pub execution_count: Option<u64>,
    /// Free-form cell metadata, passed through untouched.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Output records as fetched.
    #[serde(default)]
    pub outputs: Vec<Value>,
    /// Source lines, each normally ending with `\n` except the last.
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Vec<String>,
}

impl Cell {
    /// Build a markdown cell from source lines.
    pub fn markdown<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self::Markdown(TextCell {
            metadata: Map::new(),
            source: lines.into_iter().map(Into::into).collect(),
        })
    }

    /// Build an unexecuted code cell from source lines.
    pub fn code<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self::Code(CodeCell {
            source: lines.into_iter().map(Into::into).collect(),
            ..CodeCell::default()
        })
    }

    /// The `cell_type` string of this cell.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Markdown(_) => "markdown",
            Self::Code(_) => "code",
            Self::Raw(_) => "raw",
        }
    }

    /// Source lines of any cell kind.
    pub fn source(&self) -> &[String] {
        match self {
            Self::Markdown(c) | Self::Raw(c) => &c.source,
            Self::Code(c) => &c.source,
        }
    }

    /// Cell metadata of any cell kind.
    pub fn metadata(&self) -> &Map<String, Value> {
        match self {
            Self::Markdown(c) | Self::Raw(c) => &c.metadata,
            Self::Code(c) => &c.metadata,
        }
    }
}

/// nbformat allows `source` as either one string or a list of lines.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceRepr {
    Lines(Vec<String>),
    Text(String),
}

fn deserialize_source<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match SourceRepr::deserialize(deserializer)? {
        SourceRepr::Lines(lines) => lines,
        SourceRepr::Text(text) => split_source(&text),
    })
}

/// Split a multi-line string into nbformat source lines, keeping each `\n`.
pub fn split_source(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(String::from).collect()
}

// ---------------------------------------------------------------------------
// Notebook
// ---------------------------------------------------------------------------

/// A notebook document: its cells plus every other top-level field verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Ordered cell sequence.
    pub cells: Vec<Cell>,
    /// All remaining top-level fields (`metadata`, `nbformat`, ...), in source order.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Import jobs
// ---------------------------------------------------------------------------

/// A verbatim text substitution applied to every cell line before any other rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralPatch {
    /// Exact text to look for.
    pub find: String,
    /// Replacement text.
    pub replace: String,
}

/// One resolved unit of work: fetch `url`, prepend cells, write to `destination`.
#[derive(Debug, Clone)]
pub struct ImportJob {
    /// Where the notebook is fetched from; also substituted for [`URL_PLACEHOLDER`].
    pub url: Url,
    /// Setup cells inserted before the fetched content. Shared across jobs, never mutated.
    pub prepend_cells: Arc<[Cell]>,
    /// Relative output path, already normalized (spaces replaced by `_`).
    pub destination: PathBuf,
}
