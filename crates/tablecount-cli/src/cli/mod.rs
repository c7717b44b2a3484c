//! CLI for tablecount.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tablecount_core::config::{self, CliOverrides, Settings};
use tablecount_core::logging;
use tablecount_core::run::{self, CountOptions};
use tablecount_core::source;
use tablecount_core::table::TableName;

/// Count the rows of one table by summing `COUNT(id)` over id ranges in parallel.
///
/// The connection string comes from `--database-url`, `DATABASE_URL` or the
/// config file; `CONCURRENCY`, `STEP_SIZE` and `STRICT` are read from the
/// environment as well.
#[derive(Debug, Parser)]
#[command(name = "tablecount")]
#[command(about = "Count table rows with parallel id-range COUNT queries", long_about = None)]
pub struct Cli {
    /// Table to count (optionally schema-qualified, e.g. shop.orders).
    pub table: TableName,

    /// Maximum number of range queries running at once (default 3).
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Maximum number of ids per range query (default 100000).
    #[arg(long, value_name = "N")]
    pub step: Option<u64>,

    /// Database connection string (mysql://..., sqlite://...).
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Fail if any range query fails instead of counting that range as zero.
    #[arg(long)]
    pub strict: bool,

    /// Config file (default: $XDG_CONFIG_HOME/tablecount/config.toml if present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append diagnostics to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            database_url: self.database_url.clone(),
            concurrency: self.concurrency,
            step: self.step,
            strict: self.strict,
            log_file: self.log_file.clone(),
        }
    }

    pub async fn run(self) -> Result<()> {
        let file_cfg = config::load_or_default(self.config.as_deref())?;
        let settings = Settings::resolve(file_cfg, |k| std::env::var(k).ok(), self.overrides())?;

        if let Err(e) = logging::init_logging(settings.log_file.as_deref()) {
            logging::init_logging_stderr();
            tracing::warn!("falling back to stderr logging: {:#}", e);
        }
        tracing::debug!("loaded settings: {:?}", settings);

        let max_connections = u32::try_from(settings.concurrency).unwrap_or(u32::MAX);
        let database = source::connect(&settings.database_url, max_connections)
            .await
            .with_context(|| {
                format!(
                    "failed to connect to {}",
                    source::redact_url(&settings.database_url)
                )
            })?;

        let report =
            run::count_table(Arc::new(database), &self.table, CountOptions::from(&settings)).await?;

        println!("{}", report.result_line());
        Ok(())
    }
}

pub async fn run_from_args() -> Result<()> {
    Cli::parse().run().await
}
