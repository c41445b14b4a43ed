//! Output notebook writer.
//!
//! Notebooks are rendered as pretty JSON (2-space indentation) and written
//! atomically: temp sibling first, then rename over the destination.

use std::path::{Path, PathBuf};

use tracing::debug;

use nbimport_shared::{ImportJob, NbImportError, Notebook, Result};

/// Absolute-or-relative path a job writes to under `output_root`.
pub fn destination_path(output_root: &Path, job: &ImportJob) -> PathBuf {
    output_root.join(&job.destination)
}

/// Serialize a notebook the way it is written to disk.
pub fn render_notebook(notebook: &Notebook) -> Result<String> {
    serde_json::to_string_pretty(notebook).map_err(|e| {
        NbImportError::validation(format!("JSON serialization failed: {e}"))
    })
}

/// Write `notebook` to `path`, creating parent directories as needed.
pub fn write_notebook(path: &Path, notebook: &Notebook) -> Result<()> {
    let json = render_notebook(notebook)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| NbImportError::write(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| {
            NbImportError::validation(format!("destination has no file name: {}", path.display()))
        })?
        .to_string_lossy();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &json).map_err(|e| NbImportError::write(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        NbImportError::write(path, e)
    })?;

    debug!(path = %path.display(), bytes = json.len(), "wrote notebook");
    Ok(())
}
