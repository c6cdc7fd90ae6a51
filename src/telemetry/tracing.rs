use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name
    pub service_name: String,

    /// Log level (overridden by RUST_LOG)
    pub log_level: String,

    /// JSON console format
    pub json_logs: bool,

    /// Additional JSON log file
    pub log_file: Option<PathBuf>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "smppsim".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            log_file: None,
        }
    }
}

/// Keeps the file writer flushing until dropped.
#[must_use = "dropping the guard stops the log file writer"]
pub struct TracingGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize tracing with a console sink and an optional file sink
pub fn init_tracing(config: &TracingConfig) -> Result<TracingGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.json_logs {
        layers.push(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .boxed(),
        );
    } else {
        layers.push(fmt::layer().with_target(true).boxed());
    }

    let mut file_guard = None;
    if let Some(path) = &config.log_file {
        let (layer, guard) = file_layer(path)?;
        layers.push(layer);
        file_guard = Some(guard);
    }

    layers.push(env_filter.boxed());

    tracing_subscriber::registry().with(layers).try_init()?;

    info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        log_file = ?config.log_file,
        "tracing initialized"
    );

    Ok(TracingGuard { _file: file_guard })
}

/// JSON lines appended to `path`, written off the async workers.
fn file_layer(path: &Path) -> Result<(Box<dyn Layer<Registry> + Send + Sync>, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file path has no file name: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .json()
        .with_writer(writer)
        .with_ansi(false)
        .with_current_span(true)
        .with_target(true)
        .boxed();

    Ok((layer, guard))
}
