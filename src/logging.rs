//! Tracing setup: a compact stdout layer plus an append-only log file.
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Config;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber.
///
/// `RUST_LOG` controls filtering (default `info`). The file layer writes to [`Config::log_file`];
/// when that file cannot be opened the server keeps running with stdout logging only.
pub fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, open_error) = match open_log_file(&config.log_file) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).compact();
            (Some(layer), None)
        }
        Err(error) => (None, Some(error)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .with(file_layer)
        .init();

    let path = config.log_file.display();
    match open_error {
        Some(error) => tracing::warn!(path = %path, error = %error, "File logging disabled"),
        None => tracing::debug!(path = %path, "File logging enabled"),
    }
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
