//! Tracing configuration and log routing.
//!
//! The SDK logs to stdout using a compact formatter. When `DEBUGATTOR_LOG_FILE` is set, logs are
//! also appended to that path through a non‑blocking writer. Installation is best effort: a host
//! application that already registered a global subscriber keeps it.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::get_config;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and optional file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact stdout layer and, when configured, a file layer.
/// - Returns `false` when another global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let installed = if let Some(writer) = configure_file_writer(get_config().log_file.as_deref())
    {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).try_init().is_ok()
    } else {
        registry.try_init().is_ok()
    };

    if !installed {
        tracing::debug!("Global subscriber already installed; keeping the host's");
    }
    installed
}

/// Build a non‑blocking writer for file logging.
///
/// Returns `None` when no path is configured or the target file cannot be opened.
fn configure_file_writer(path: Option<&str>) -> Option<NonBlocking> {
    let path = path?;
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(non_blocking)
        }
        Err(err) => {
            eprintln!("Failed to open log file {path}: {err}");
            None
        }
    }
}
