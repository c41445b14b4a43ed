//! Cell sequence transformation: prepend setup cells, rewrite every line,
//! and reset execution state on code cells.

use tracing::{debug, instrument};

use nbimport_shared::{Cell, CodeCell, LiteralPatch, Notebook, TextCell};

use crate::rewrite::rewrite_line;

/// Build `prepend ++ original`, rewriting every line for `source_url`.
///
/// No literal patches are applied; use [`Transformer::with_patches`] for that.
pub fn transform(original: &[Cell], prepend: &[Cell], source_url: &str) -> Vec<Cell> {
    Transformer::new(source_url).transform(original, prepend)
}

/// Rewrites cells for one source URL and a fixed patch table.
#[derive(Debug, Clone)]
pub struct Transformer {
    source_url: String,
    patches: Vec<LiteralPatch>,
}

impl Transformer {
    /// Create a transformer that substitutes `source_url` for `%URL%`.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            patches: Vec::new(),
        }
    }

    /// Apply `patches` (in order) to every line before any other rewrite.
    pub fn with_patches(mut self, patches: impl IntoIterator<Item = LiteralPatch>) -> Self {
        self.patches.extend(patches);
        self
    }

    /// The URL substituted for the placeholder.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Produce the new cell sequence. Inputs are never mutated; every output
    /// cell is freshly built.
    pub fn transform(&self, original: &[Cell], prepend: &[Cell]) -> Vec<Cell> {
        prepend
            .iter()
            .chain(original)
            .map(|cell| self.rewrite_cell(cell))
            .collect()
    }

    /// Replace `notebook`'s cells with the transformed sequence; every other
    /// top-level field is kept as-is.
    #[instrument(skip_all, fields(source_url = %self.source_url))]
    pub fn transform_notebook(&self, notebook: Notebook, prepend: &[Cell]) -> Notebook {
        let cells = self.transform(&notebook.cells, prepend);

        debug!(
            prepended = prepend.len(),
            original = notebook.cells.len(),
            total = cells.len(),
            "notebook transformed"
        );

        Notebook {
            cells,
            rest: notebook.rest,
        }
    }

    fn rewrite_cell(&self, cell: &Cell) -> Cell {
        match cell {
            Cell::Code(code) => Cell::Code(CodeCell {
                execution_count: None,
                metadata: code.metadata.clone(),
                outputs: Vec::new(),
                source: self.rewrite_lines(&code.source),
            }),
            Cell::Markdown(text) => Cell::Markdown(self.rewrite_text(text)),
            Cell::Raw(text) => Cell::Raw(self.rewrite_text(text)),
        }
    }

    fn rewrite_text(&self, text: &TextCell) -> TextCell {
        TextCell {
            metadata: text.metadata.clone(),
            source: self.rewrite_lines(&text.source),
        }
    }

    fn rewrite_lines(&self, lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .map(|line| rewrite_line(line, &self.source_url, &self.patches))
            .collect()
    }
}
