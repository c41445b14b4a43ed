//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use nbimport_core::{JobOutcome, ProgressReporter, RunReport, destination_path};
use nbimport_fetcher::HttpFetcher;
use nbimport_notebook::Transformer;
use nbimport_shared::{
    AppConfig, FetchConfig, ImportJob, JobCatalog, NbImportError, Notebook, RunOptions,
    config_file_path, init_config, load_config, load_config_from,
};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nbimport: bring gallery notebooks into the playground.
#[derive(Parser)]
#[command(
    name = "nbimport",
    version,
    about = "Fetch notebooks, prepend setup cells, rewrite GitHub links, and write them locally.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.nbimport/nbimport.toml).
    #[arg(long, global = true, env = "NBIMPORT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Import every notebook in the catalog.
    Run {
        /// Job catalog (defaults to the built-in mplsoccer catalog).
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output root that destinations are resolved against.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Re-import even when the destination already exists.
        #[arg(long)]
        force: bool,

        /// Abort on the first failing job.
        #[arg(long)]
        fail_fast: bool,

        /// Only run jobs whose URL or destination contains this text.
        #[arg(long)]
        only: Option<String>,
    },

    /// List catalog jobs and whether their destination exists.
    List {
        /// Job catalog (defaults to the built-in mplsoccer catalog).
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output root that destinations are resolved against.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Transform a local notebook file without fetching anything.
    Transform {
        /// Notebook (.ipynb) to transform.
        input: PathBuf,

        /// Source URL substituted for %URL%.
        #[arg(long)]
        url: String,

        /// Catalog template whose cells are prepended.
        #[arg(long)]
        template: Option<String>,

        /// Catalog providing templates and patches.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Write here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nbimport=info",
        1 => "nbimport=debug",
        _ => "nbimport=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = load_app_config(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            catalog,
            out,
            force,
            fail_fast,
            only,
        } => {
            cmd_run(
                &config,
                catalog.as_deref(),
                out.as_deref(),
                force,
                fail_fast,
                only.as_deref(),
            )
            .await
        }
        Command::List { catalog, out } => cmd_list(&config, catalog.as_deref(), out.as_deref()).await,
        Command::Transform {
            input,
            url,
            template,
            catalog,
            output,
        } => {
            cmd_transform(
                &config,
                &input,
                &url,
                template.as_deref(),
                catalog.as_deref(),
                output.as_deref(),
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// `--catalog` wins over the config file's `catalog`, which wins over the built-in one.
fn load_catalog(config: &AppConfig, flag: Option<&Path>) -> Result<JobCatalog> {
    let configured = config.defaults.catalog.as_deref().map(Path::new);
    Ok(JobCatalog::load_or_builtin(flag.or(configured))?)
}

/// Keep jobs whose URL or destination contains `needle`.
fn filter_jobs(jobs: Vec<ImportJob>, needle: Option<&str>) -> Vec<ImportJob> {
    match needle {
        Some(needle) => jobs
            .into_iter()
            .filter(|job| {
                job.url.as_str().contains(needle)
                    || job.destination.to_string_lossy().contains(needle)
            })
            .collect(),
        None => jobs,
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config: &AppConfig,
    catalog: Option<&Path>,
    out: Option<&Path>,
    force: bool,
    fail_fast: bool,
    only: Option<&str>,
) -> Result<()> {
    let resolved = load_catalog(config, catalog)?.resolve()?;
    let jobs = filter_jobs(resolved.jobs, only);
    if jobs.is_empty() {
        return Err(eyre!("no jobs to run"));
    }

    let mut options = RunOptions::from(config);
    if let Some(out) = out {
        options.output_root = out.to_path_buf();
    }
    options.skip_existing = options.skip_existing && !force;
    options.fail_fast = options.fail_fast || fail_fast;

    let fetcher = HttpFetcher::new(&FetchConfig::from(config))?;

    info!(
        jobs = jobs.len(),
        output_root = %options.output_root.display(),
        "importing notebooks"
    );

    let reporter = CliProgress::new();
    let report =
        nbimport_core::run_all(&fetcher, &jobs, &resolved.patches, &options, &reporter).await?;

    // Print summary
    println!();
    println!("  Written: {}", report.written.len());
    println!("  Skipped: {}", report.skipped.len());
    println!("  Failed:  {}", report.failed.len());
    println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());
    for (url, error) in &report.failed {
        println!("    {url}: {error}");
    }
    println!();

    if !report.is_success() {
        return Err(eyre!(
            "{} of {} jobs failed",
            report.failed.len(),
            report.total()
        ));
    }

    Ok(())
}

async fn cmd_list(config: &AppConfig, catalog: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let resolved = load_catalog(config, catalog)?.resolve()?;
    let output_root = match out {
        Some(out) => out.to_path_buf(),
        None => RunOptions::from(config).output_root,
    };

    for job in &resolved.jobs {
        let path = destination_path(&output_root, job);
        let status = if path.exists() { "present" } else { "pending" };
        println!("{status:<8} {}", path.display());
        println!("         {}", job.url);
    }
    println!();
    println!("  {} jobs, {} patches", resolved.jobs.len(), resolved.patches.len());

    Ok(())
}

async fn cmd_transform(
    config: &AppConfig,
    input: &Path,
    url: &str,
    template: Option<&str>,
    catalog: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let notebook = transform_local(config, input, url, template, catalog)?;

    match output {
        Some(path) => {
            nbimport_core::write_notebook(path, &notebook)?;
            info!(path = %path.display(), cells = notebook.cells.len(), "wrote notebook");
        }
        None => println!("{}", nbimport_core::render_notebook(&notebook)?),
    }

    Ok(())
}

/// Read `input`, then prepend `template`'s cells and rewrite for `url`.
fn transform_local(
    config: &AppConfig,
    input: &Path,
    url: &str,
    template: Option<&str>,
    catalog: Option<&Path>,
) -> Result<Notebook> {
    let parsed_url = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;
    let catalog = load_catalog(config, catalog)?;

    let prepend = match template {
        Some(name) => catalog
            .templates
            .get(name)
            .map(|t| t.cells.clone())
            .ok_or_else(|| eyre!("unknown template '{name}'"))?,
        None => Vec::new(),
    };

    let content = std::fs::read_to_string(input).map_err(|e| NbImportError::io(input, e))?;
    let notebook: Notebook = serde_json::from_str(&content).map_err(|e| {
        NbImportError::parse(format!("{} is not a valid notebook: {e}", input.display()))
    })?;

    Ok(Transformer::new(parsed_url.as_str())
        .with_patches(catalog.patches)
        .transform_notebook(notebook, &prepend))
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    println!("# {}", config_file_path()?.display());
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn job_started(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Importing [{current}/{total}] {url}"));
    }

    fn job_finished(&self, outcome: &JobOutcome) {
        if let JobOutcome::Written { path, cells } = outcome {
            self.spinner
                .println(format!("  wrote {} ({cells} cells)", path.display()));
        }
    }

    fn job_failed(&self, url: &str, error: &str) {
        self.spinner.println(format!("  failed {url}: {error}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
