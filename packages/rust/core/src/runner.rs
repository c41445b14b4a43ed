//! Job runner: for each import job, in order, skip / fetch / transform / write.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use nbimport_fetcher::NotebookSource;
use nbimport_notebook::Transformer;
use nbimport_shared::{ImportJob, LiteralPatch, Result, RunOptions};

use crate::store::{destination_path, write_notebook};

/// What happened to a single job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The notebook was fetched, transformed, and written.
    Written {
        path: PathBuf,
        /// Number of cells in the written notebook.
        cells: usize,
    },
    /// The destination already existed; nothing was fetched.
    Skipped { path: PathBuf },
}

/// Summary of a completed run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Destinations written this run.
    pub written: Vec<PathBuf>,
    /// Destinations left untouched because they already existed.
    pub skipped: Vec<PathBuf>,
    /// Failed jobs (source URL, error message).
    pub failed: Vec<(String, String)>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl RunReport {
    /// `true` when no job failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of jobs that were attempted.
    pub fn total(&self) -> usize {
        self.written.len() + self.skipped.len() + self.failed.len()
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a job starts (`current` is 1-based).
    fn job_started(&self, url: &str, current: usize, total: usize);
    /// Called after a job completes successfully.
    fn job_finished(&self, outcome: &JobOutcome);
    /// Called when a job fails and the run continues.
    fn job_failed(&self, url: &str, error: &str);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn job_started(&self, _url: &str, _current: usize, _total: usize) {}
    fn job_finished(&self, _outcome: &JobOutcome) {}
    fn job_failed(&self, _url: &str, _error: &str) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run a single import job.
///
/// 1. Skip if the destination exists (when `skip_existing`)
/// 2. Fetch the notebook
/// 3. Prepend setup cells and rewrite every line
/// 4. Write it under `output_root`
#[instrument(skip_all, fields(url = %job.url, destination = %job.destination.display()))]
pub async fn run_job<S: NotebookSource>(
    source: &S,
    job: &ImportJob,
    patches: &[LiteralPatch],
    options: &RunOptions,
) -> Result<JobOutcome> {
    let path = destination_path(&options.output_root, job);

    if options.skip_existing && path.exists() {
        info!(path = %path.display(), "destination exists, skipping");
        return Ok(JobOutcome::Skipped { path });
    }

    let notebook = source.fetch(&job.url).await?;

    let transformed = Transformer::new(job.url.as_str())
        .with_patches(patches.iter().cloned())
        .transform_notebook(notebook, &job.prepend_cells);
    let cells = transformed.cells.len();

    write_notebook(&path, &transformed)?;

    info!(path = %path.display(), cells, "notebook imported");
    Ok(JobOutcome::Written { path, cells })
}

/// Run every job strictly in order.
///
/// A failing job is logged and recorded in the report, and the run moves on.
/// With `fail_fast` the first failure is returned instead.
#[instrument(skip_all, fields(jobs = jobs.len(), output_root = %options.output_root.display()))]
pub async fn run_all<S: NotebookSource>(
    source: &S,
    jobs: &[ImportJob],
    patches: &[LiteralPatch],
    options: &RunOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let total = jobs.len();
    let mut report = RunReport::default();

    info!(
        total,
        skip_existing = options.skip_existing,
        fail_fast = options.fail_fast,
        "starting import run"
    );

    for (i, job) in jobs.iter().enumerate() {
        progress.job_started(job.url.as_str(), i + 1, total);

        match run_job(source, job, patches, options).await {
            Ok(outcome) => {
                progress.job_finished(&outcome);
                match outcome {
                    JobOutcome::Written { path, .. } => report.written.push(path),
                    JobOutcome::Skipped { path } => report.skipped.push(path),
                }
            }
            Err(e) if options.fail_fast => {
                warn!(url = %job.url, error = %e, "job failed, aborting run");
                return Err(e);
            }
            Err(e) => {
                warn!(url = %job.url, error = %e, "job failed, continuing");
                progress.job_failed(job.url.as_str(), &e.to_string());
                report.failed.push((job.url.to_string(), e.to_string()));
            }
        }
    }

    report.elapsed = start.elapsed();
    progress.done(&report);

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        duration_ms = report.elapsed.as_millis(),
        "import run completed"
    );

    Ok(report)
}
