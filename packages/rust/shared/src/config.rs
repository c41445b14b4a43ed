//! Application configuration for nbimport.
//!
//! User config lives at `~/.nbimport/nbimport.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NbImportError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nbimport.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nbimport";

// ---------------------------------------------------------------------------
// Config structs (matching nbimport.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP fetch settings.
    #[serde(default)]
    pub fetch: FetchSettings,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory that job destinations are resolved against.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Leave destinations that already exist untouched.
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    /// Abort the whole run on the first failing job.
    #[serde(default)]
    pub fail_fast: bool,

    /// Job catalog file; the built-in catalog is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            skip_existing: true,
            fail_fast: false,
            catalog: None,
        }
    }
}

fn default_output_root() -> String {
    ".".into()
}
fn default_true() -> bool {
    true
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Largest `Content-Length` accepted, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    5
}
fn default_max_response_bytes() -> u64 {
    50 * 1024 * 1024
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub max_response_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.fetch.timeout_secs,
            max_redirects: config.fetch.max_redirects,
            max_response_bytes: config.fetch.max_response_bytes,
        }
    }
}

/// Runtime job-runner options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root every job destination is joined onto.
    pub output_root: PathBuf,
    /// Skip jobs whose destination already exists.
    pub skip_existing: bool,
    /// Stop at the first failing job instead of recording it and moving on.
    pub fail_fast: bool,
}

impl From<&AppConfig> for RunOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_root: PathBuf::from(&config.defaults.output_root),
            skip_existing: config.defaults.skip_existing,
            fail_fast: config.defaults.fail_fast,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nbimport/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NbImportError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nbimport/nbimport.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NbImportError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        NbImportError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NbImportError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NbImportError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NbImportError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_root"));
        assert!(toml_str.contains("timeout_secs = 30"));
        assert!(!toml_str.contains("catalog"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert!(parsed.defaults.skip_existing);
        assert!(!parsed.defaults.fail_fast);
        assert_eq!(parsed.fetch.max_redirects, 5);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
output_root = "/tmp/playground"
catalog = "jobs.toml"

[fetch]
timeout_secs = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_root, "/tmp/playground");
        assert_eq!(config.defaults.catalog.as_deref(), Some("jobs.toml"));
        assert!(config.defaults.skip_existing);
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.fetch.max_response_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn runtime_configs_from_app_config() {
        let app = AppConfig::default();
        let fetch = FetchConfig::from(&app);
        assert_eq!(fetch.timeout_secs, 30);
        let run = RunOptions::from(&app);
        assert_eq!(run.output_root, PathBuf::from("."));
        assert!(run.skip_existing);
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/nbimport.toml")).unwrap_err();
        assert!(matches!(err, NbImportError::Io { .. }));
    }
}
