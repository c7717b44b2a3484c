use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::FailurePolicy;

pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_STEP: u64 = 100_000;

/// Environment variable names.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_CONCURRENCY: &str = "CONCURRENCY";
pub const ENV_STEP_SIZE: &str = "STEP_SIZE";
pub const ENV_STRICT: &str = "STRICT";

/// Configuration problem detected before any query runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set (or pass --database-url)")]
    MissingDatabaseUrl,
    #[error("invalid {name}: {value:?} is not a positive integer")]
    InvalidNumber { name: &'static str, value: String },
    #[error("invalid {name}: {value:?} is not a boolean")]
    InvalidBool { name: &'static str, value: String },
    #[error("invalid {name}: must be at least 1")]
    Zero { name: &'static str },
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot locate config directory: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
}

/// Optional settings file (`~/.config/tablecount/config.toml`). Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub database_url: Option<String>,
    /// Maximum number of range queries in flight.
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Maximum number of ids per range query.
    #[serde(default)]
    pub step: Option<u64>,
    /// Fail the run when any range query fails instead of counting it as zero.
    #[serde(default)]
    pub strict: Option<bool>,
    /// Append diagnostics to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub concurrency: Option<usize>,
    pub step: Option<u64>,
    pub strict: bool,
    pub log_file: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub concurrency: usize,
    pub step: u64,
    pub strict: bool,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.strict {
            FailurePolicy::Abort
        } else {
            FailurePolicy::SkipFailed
        }
    }

    /// Resolve settings: defaults, then `file`, then environment (via `env`), then `cli`.
    pub fn resolve<F>(file: FileConfig, env: F, cli: CliOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let env_concurrency = lookup(ENV_CONCURRENCY)
            .map(|v| parse_number::<usize>(ENV_CONCURRENCY, &v))
            .transpose()?;
        let env_step = lookup(ENV_STEP_SIZE)
            .map(|v| parse_number::<u64>(ENV_STEP_SIZE, &v))
            .transpose()?;
        let env_strict = lookup(ENV_STRICT)
            .map(|v| parse_bool(ENV_STRICT, &v))
            .transpose()?;

        let database_url = cli
            .database_url
            .or_else(|| lookup(ENV_DATABASE_URL))
            .or(file.database_url)
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let concurrency = cli
            .concurrency
            .or(env_concurrency)
            .or(file.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::Zero {
                name: "concurrency",
            });
        }

        let step = cli.step.or(env_step).or(file.step).unwrap_or(DEFAULT_STEP);
        if step == 0 {
            return Err(ConfigError::Zero { name: "step size" });
        }

        let strict = cli.strict || env_strict.or(file.strict).unwrap_or(false);

        Ok(Self {
            database_url,
            concurrency,
            step,
            strict,
            log_file: cli.log_file.or(file.log_file),
        })
    }
}

// Hand-written so the connection string (and its password) never reaches the logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field(
                "database_url",
                &crate::source::redact_url(&self.database_url),
            )
            .field("concurrency", &self.concurrency)
            .field("step", &self.step)
            .field("strict", &self.strict)
            .field("log_file", &self.log_file)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}

/// Default config file location; the file itself need not exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tablecount")?;
    Ok(xdg_dirs.get_config_home().join("config.toml"))
}

/// Load a config file. A missing file yields the empty config.
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    read_file(path)
}

/// Load `explicit` if given (it must exist), otherwise the default path if present.
pub fn load_or_default(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    match explicit {
        Some(path) => read_file(path),
        None => load_file(&config_path()?),
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: FileConfig = toml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("loaded config file {}", path.display());
    Ok(cfg)
}
