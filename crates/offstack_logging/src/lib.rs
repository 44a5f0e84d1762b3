//! Logging bootstrap for the offstack binary.
//!
//! Two layers share one env filter: an ANSI stderr layer for the terminal
//! and a plain daily-rolling file layer under the log directory. The
//! returned guard must stay alive for the process lifetime or buffered
//! file output is lost.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter applied when RUST_LOG is unset.
const DEFAULT_LOG_FILTER: &str = "info";
/// Filter applied when RUST_LOG is unset and --verbose was given.
const VERBOSE_LOG_FILTER: &str = "debug,hyper=info";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub app_name: String,
    pub verbose: bool,
    pub log_dir: PathBuf,
}

impl LogConfig {
    pub fn new(app_name: impl Into<String>, log_dir: PathBuf) -> Self {
        Self {
            app_name: app_name.into(),
            verbose: false,
            log_dir,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Install the global subscriber. RUST_LOG wins over the built-in filter.
pub fn init_logging(config: &LogConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.verbose {
            VERBOSE_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        })
    });

    std::fs::create_dir_all(&config.log_dir).with_context(|| {
        format!(
            "Failed to create log directory: {}",
            config.log_dir.display()
        )
    })?;
    let file_appender =
        tracing_appender::rolling::daily(&config.log_dir, format!("{}.log", config.app_name));
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
