//! Tracing setup for the binary and for applications embedding the engine.
//!
//! Diagnostics go to stderr so the binary's stdout stays machine-readable.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "learning-history.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `learning_history=debug`.
    pub filter: String,
    /// Daily-rolling file output lands here when set.
    pub file_dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file_dir: None,
        }
    }
}

/// Flushes the file writer when dropped.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|err| {
        eprintln!("invalid log filter {directive:?} ({err}), falling back to info");
        EnvFilter::new("info")
    })
}

fn rolling_writer(dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("failed to create log directory {}: {err}", dir.display());
        return None;
    }
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}

/// Installs the global subscriber. A second call keeps the first subscriber
/// but still opens the requested log directory.
pub fn init_tracing(settings: &LogSettings) -> Option<FileLogGuard> {
    let (file_layer, guard) = match settings.file_dir.as_deref().and_then(rolling_writer) {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter(&settings.filter))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    guard.map(|guard| FileLogGuard { _guard: guard })
}
