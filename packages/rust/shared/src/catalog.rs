//! Job catalog: the list of notebooks to import, their setup-cell templates,
//! and the literal patches applied to every cell.
//!
//! A catalog is TOML:
//!
//! ```toml
//! [[patches]]
//! find = "FontManager()"
//! replace = "FontManager('https://example.com/Roboto.ttf')"
//!
//! [[templates.setup.cells]]
//! cell_type = "markdown"
//! source = ["Original notebook can be found [here](%URL%)"]
//!
//! [[jobs]]
//! url = "https://docs.example.com/_downloads/plot.ipynb"
//! template = "setup"
//! destination = "content/Plots/My Plot.ipynb"
//! ```
//!
//! The built-in catalog ships inside the binary; `--catalog` swaps in another one.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{NbImportError, Result};
use crate::types::{Cell, ImportJob, LiteralPatch};

/// The mplsoccer gallery catalog compiled into the binary.
pub const BUILTIN_CATALOG: &str = include_str!("../../../../catalog/mplsoccer.toml");

// ---------------------------------------------------------------------------
// Catalog schema
// ---------------------------------------------------------------------------

/// Parsed (but not yet validated) catalog file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobCatalog {
    /// Literal substitutions applied to every cell line, in order.
    #[serde(default)]
    pub patches: Vec<LiteralPatch>,

    /// Named prepend-cell templates.
    #[serde(default)]
    pub templates: BTreeMap<String, Template>,

    /// Jobs in run order.
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

/// `[templates.<name>]`: cells inserted ahead of each fetched notebook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

/// `[[jobs]]` entry as written in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct JobEntry {
    /// Source notebook URL.
    pub url: String,
    /// Template name; no template means nothing is prepended.
    #[serde(default)]
    pub template: Option<String>,
    /// Output path relative to the output root (spaces allowed, normalized later).
    pub destination: String,
}

/// Validated catalog, ready to run.
#[derive(Debug, Clone)]
pub struct ResolvedCatalog {
    pub jobs: Vec<ImportJob>,
    pub patches: Vec<LiteralPatch>,
}

// ---------------------------------------------------------------------------
// Loading and resolution
// ---------------------------------------------------------------------------

impl JobCatalog {
    /// Parse the catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CATALOG)
    }

    /// Parse catalog TOML.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| NbImportError::config(format!("invalid job catalog: {e}")))
    }

    /// Load a catalog from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NbImportError::io(path, e))?;
        toml::from_str(&content).map_err(|e| {
            NbImportError::config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Load from `path` when given, else fall back to the built-in catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    /// Validate every entry and turn it into an [`ImportJob`].
    ///
    /// Jobs referencing the same template share one `Arc<[Cell]>`.
    pub fn resolve(&self) -> Result<ResolvedCatalog> {
        let templates: BTreeMap<&str, Arc<[Cell]>> = self
            .templates
            .iter()
            .map(|(name, t)| (name.as_str(), Arc::from(t.cells.clone())))
            .collect();
        let empty: Arc<[Cell]> = Arc::from(Vec::new());

        let mut seen = HashSet::new();
        let mut jobs = Vec::with_capacity(self.jobs.len());

        for entry in &self.jobs {
            let url = Url::parse(&entry.url).map_err(|e| {
                NbImportError::config(format!("invalid job URL '{}': {e}", entry.url))
            })?;

            let prepend_cells = match entry.template.as_deref() {
                Some(name) => templates.get(name).cloned().ok_or_else(|| {
                    NbImportError::config(format!(
                        "job '{}' references unknown template '{name}'",
                        entry.url
                    ))
                })?,
                None => empty.clone(),
            };

            let destination = normalize_destination(&entry.destination)?;
            if !seen.insert(destination.clone()) {
                return Err(NbImportError::config(format!(
                    "destination '{}' is used by more than one job",
                    destination.display()
                )));
            }

            jobs.push(ImportJob {
                url,
                prepend_cells,
                destination,
            });
        }

        debug!(
            jobs = jobs.len(),
            templates = templates.len(),
            patches = self.patches.len(),
            "job catalog resolved"
        );

        Ok(ResolvedCatalog {
            jobs,
            patches: self.patches.clone(),
        })
    }
}

/// Turn a catalog destination into a safe relative path.
///
/// Spaces become underscores. Absolute paths, `..` components, and paths that
/// do not end in a file name (`.`, `content/`, `content/.`) are rejected.
pub fn normalize_destination(destination: &str) -> Result<PathBuf> {
    let trimmed = destination.trim();
    if trimmed.is_empty() {
        return Err(NbImportError::config("job destination is empty"));
    }

    let path = PathBuf::from(trimmed.replace(' ', "_"));
    if path.is_absolute() || path.has_root() {
        return Err(NbImportError::config(format!(
            "job destination must be relative: '{destination}'"
        )));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(NbImportError::config(format!(
            "job destination must not contain '..': '{destination}'"
        )));
    }

    // `Path::components` drops a trailing `.` or `/`, so check the raw text too.
    let last_segment = trimmed.rsplit(['/', '\\']).next().unwrap_or_default();
    let names_file = matches!(path.components().next_back(), Some(Component::Normal(_)));
    if !names_file || matches!(last_segment, "" | ".") {
        return Err(NbImportError::config(format!(
            "job destination must name a file: '{destination}'"
        )));
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
[[patches]]
find = "FontManager()"
replace = "FontManager('https://example.com/font.ttf')"

[[templates.setup.cells]]
cell_type = "markdown"
source = ["See %URL%"]

[[templates.setup.cells]]
cell_type = "code"
source = ["%pip install pandas"]

[[jobs]]
url = "https://docs.example.com/a.ipynb"
template = "setup"
destination = "content/Group A/First One.ipynb"

[[jobs]]
url = "https://docs.example.com/b.ipynb"
destination = "content/b.ipynb"
"#;

    #[test]
    fn builtin_catalog_resolves() {
        let resolved = JobCatalog::builtin()
            .and_then(|c| c.resolve())
            .expect("builtin catalog");
        assert_eq!(resolved.jobs.len(), 33);
        assert_eq!(resolved.patches.len(), 1);
        assert_eq!(resolved.patches[0].find, "FontManager()");

        let first = &resolved.jobs[0];
        assert_eq!(
            first.destination,
            PathBuf::from("content/mplsoccer_/Radar_Charts/Radar_Charts.ipynb")
        );
        assert_eq!(first.prepend_cells.len(), 4);
        assert_eq!(first.prepend_cells[1].kind(), "code");
        assert_eq!(
            first.prepend_cells[3].source(),
            ["Original notebook can be found [here](%URL%)"]
        );
    }

    #[test]
    fn jobs_share_one_template_allocation() {
        let resolved = JobCatalog::builtin().unwrap().resolve().unwrap();
        assert!(Arc::ptr_eq(
            &resolved.jobs[0].prepend_cells,
            &resolved.jobs[1].prepend_cells
        ));
    }

    #[test]
    fn small_catalog_resolves_in_order() {
        let resolved = JobCatalog::parse(SMALL).unwrap().resolve().unwrap();
        assert_eq!(resolved.jobs.len(), 2);
        assert_eq!(resolved.jobs[0].url.as_str(), "https://docs.example.com/a.ipynb");
        assert_eq!(
            resolved.jobs[0].destination,
            PathBuf::from("content/Group_A/First_One.ipynb")
        );
        assert_eq!(resolved.jobs[0].prepend_cells.len(), 2);
        assert!(resolved.jobs[1].prepend_cells.is_empty());
    }

    #[test]
    fn unknown_template_is_rejected() {
        let toml = r#"
[[jobs]]
url = "https://docs.example.com/a.ipynb"
template = "missing"
destination = "a.ipynb"
"#;
        let err = JobCatalog::parse(toml).unwrap().resolve().unwrap_err();
        assert!(err.to_string().contains("unknown template 'missing'"));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let toml = r#"
[[jobs]]
url = "not a url"
destination = "a.ipynb"
"#;
        let err = JobCatalog::parse(toml).unwrap().resolve().unwrap_err();
        assert!(err.to_string().contains("invalid job URL"));
    }

    #[test]
    fn duplicate_destination_is_rejected() {
        let toml = r#"
[[jobs]]
url = "https://docs.example.com/a.ipynb"
destination = "out/My Plot.ipynb"

[[jobs]]
url = "https://docs.example.com/b.ipynb"
destination = "out/My_Plot.ipynb"
"#;
        let err = JobCatalog::parse(toml).unwrap().resolve().unwrap_err();
        assert!(err.to_string().contains("more than one job"));
    }

    #[test]
    fn destination_normalization() {
        assert_eq!(
            normalize_destination("content/Pitches/Pass plot using lines.ipynb").unwrap(),
            PathBuf::from("content/Pitches/Pass_plot_using_lines.ipynb")
        );
        assert!(normalize_destination("").is_err());
        assert!(normalize_destination("/etc/passwd").is_err());
        assert!(normalize_destination("content/../../escape.ipynb").is_err());
        assert!(normalize_destination(".").is_err());
        assert!(normalize_destination("content/").is_err());
        assert!(normalize_destination("content/.").is_err());
        assert!(normalize_destination("content/./nb.ipynb").is_ok());
    }

    #[test]
    fn directory_destination_fails_resolution() {
        let toml = r#"
[[jobs]]
url = "https://docs.example.com/a.ipynb"
destination = "content/"
"#;
        let err = JobCatalog::parse(toml).unwrap().resolve().unwrap_err();
        assert!(matches!(err, NbImportError::Config { .. }));
        assert!(err.to_string().contains("must name a file"));
    }

    #[test]
    fn builtin_keeps_reference_destination_bytes() {
        let resolved = JobCatalog::builtin().unwrap().resolve().unwrap();
        assert!(resolved.jobs.iter().any(|j| {
            j.destination
                == PathBuf::from("content/mplsoccer_/Pitches/Heatmap_Juego_de_Posici\u{221a}\u{2265}n.ipynb")
        }));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = JobCatalog::parse("[[jobs]]\nurl = 3").unwrap_err();
        assert!(matches!(err, NbImportError::Config { .. }));
    }
}
