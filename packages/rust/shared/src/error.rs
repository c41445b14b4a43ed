//! Error types for nbimport.
//!
//! Library crates use [`NbImportError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all nbimport operations.
#[derive(Debug, thiserror::Error)]
pub enum NbImportError {
    /// Configuration or job catalog loading/validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network failure, non-success status, or a body that is not a notebook.
    #[error("fetch error: {url}: {message}")]
    Fetch { url: String, message: String },

    /// Local notebook JSON could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Creating directories for, or writing, an output notebook failed.
    #[error("write error at {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem I/O error outside the output write path (config, local inputs).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad destination, serialization failure, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NbImportError>;

impl NbImportError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch error for `url`.
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` raised while producing an output file.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NbImportError::config("unknown template 'foo'");
        assert_eq!(err.to_string(), "config error: unknown template 'foo'");

        let err = NbImportError::fetch("https://example.com/a.ipynb", "HTTP 404 Not Found");
        assert_eq!(
            err.to_string(),
            "fetch error: https://example.com/a.ipynb: HTTP 404 Not Found"
        );
    }

    #[test]
    fn write_error_keeps_path() {
        let err = NbImportError::write(
            "content/a.ipynb",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("write error at"));
        assert!(msg.contains("content/a.ipynb"));
        assert!(msg.contains("denied"));
    }
}
