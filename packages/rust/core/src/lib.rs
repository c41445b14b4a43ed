//! Import run orchestration for nbimport.
//!
//! This crate ties the fetcher, the cell transformer, and the notebook writer
//! into the batch workflow: for each job, skip / fetch / transform / write.

pub mod runner;
pub mod store;

pub use runner::{JobOutcome, ProgressReporter, RunReport, SilentProgress, run_all, run_job};
pub use store::{destination_path, render_notebook, write_notebook};
