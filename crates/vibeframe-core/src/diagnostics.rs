use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::DiagnosticsConfig;

pub const DEFAULT_LOG_FILTER: &str = "warn,vibeframe_core=info";
pub const DEFAULT_LOG_FILE_PREFIX: &str = "vibeframe";

/// Keeps the file writer flushing until the CLI command finishes.
pub struct TelemetryGuard {
    pub session_id: Uuid,
    pub log_file: PathBuf,
    _file_guard: WorkerGuard,
}

/// Where the active log filter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterSource {
    Env,
    Config,
    Fallback,
}

/// `RUST_LOG` wins when it parses, then the configured filter, then the
/// built-in default.
fn resolve_filter(env: Option<&str>, configured: &str) -> (EnvFilter, FilterSource) {
    if let Some(filter) = env
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
    {
        return (filter, FilterSource::Env);
    }
    match EnvFilter::try_new(configured) {
        Ok(filter) => (filter, FilterSource::Config),
        Err(_) => (EnvFilter::new(DEFAULT_LOG_FILTER), FilterSource::Fallback),
    }
}

fn session_log_file_name(prefix: &str, started_at: DateTime<Utc>) -> String {
    format!("{prefix}-{}.log", started_at.format("%Y%m%d-%H%M%S"))
}

/// Compact stderr output plus one JSON log file per CLI session in `log_dir`.
pub fn init_tracing(
    log_dir: impl AsRef<Path>,
    config: &DiagnosticsConfig,
) -> anyhow::Result<TelemetryGuard> {
    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let session_id = Uuid::new_v4();
    let file_name = session_log_file_name(&config.trace_file_prefix, Utc::now());
    let log_file = log_dir.join(&file_name);
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (env_filter, filter_source) = resolve_filter(env.as_deref(), &config.rust_log_filter);

    // stdout belongs to command output
    let console_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true)
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(file_writer);

    if let Err(error) = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        warn!(?error, "global tracing subscriber already initialized");
    } else {
        info!(%session_id, log_file = %log_file.display(), ?filter_source, "tracing initialized");
        if filter_source == FilterSource::Fallback {
            warn!(
                configured = %config.rust_log_filter,
                "configured log filter is invalid; using {DEFAULT_LOG_FILTER}"
            );
        }
    }

    Ok(TelemetryGuard {
        session_id,
        log_file,
        _file_guard: file_guard,
    })
}
