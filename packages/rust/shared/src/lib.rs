//! Shared types, error model, job catalog, and configuration for nbimport.
//!
//! This crate is the foundation depended on by all other nbimport crates.
//! It provides:
//! - [`NbImportError`]: the unified error type
//! - Domain types ([`Notebook`], [`Cell`], [`ImportJob`], [`LiteralPatch`])
//! - The job catalog ([`JobCatalog`], [`ResolvedCatalog`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`RunOptions`], config loading)

pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use catalog::{
    BUILTIN_CATALOG, JobCatalog, JobEntry, ResolvedCatalog, Template, normalize_destination,
};
pub use config::{
    AppConfig, DefaultsConfig, FetchConfig, FetchSettings, RunOptions, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{NbImportError, Result};
pub use types::{
    Cell, CodeCell, ImportJob, LiteralPatch, Notebook, TextCell, URL_PLACEHOLDER, split_source,
};
