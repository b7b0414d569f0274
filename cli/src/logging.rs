use std::path::Path;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{runtime_dir, LogLevel};

const LOG_PREFIX: &str = "cellgauge";

static INIT: OnceLock<()> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Stderr,
    /// Stderr plus a daily rolling file, for long-running commands.
    Both,
}

pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

pub fn init(level: LogLevel, mode: LogMode, cli_override: Option<LogLevel>) -> LogGuard {
    let mut guard = None;

    INIT.get_or_init(|| {
        let Some(level) = cli_override.unwrap_or(level).as_tracing_level() else {
            return;
        };

        let file = match mode {
            LogMode::Both => open_log_file(&runtime_dir()),
            LogMode::Stderr => None,
        };
        let file_layer = file.map(|(writer, worker)| {
            guard = Some(worker);
            fmt::layer()
                .with_writer(writer)
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter(level))
        });

        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(UtcTime::rfc_3339())
            .with_target(true)
            .with_filter(env_filter(level));

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .init();
    });

    LogGuard { _guard: guard }
}

/// `RUST_LOG` directives win over `level`.
fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

fn open_log_file(dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Warning: Failed to create log directory {:?}: {}", dir, e);
        return None;
    }

    match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .max_log_files(7)
        .build(dir)
    {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(e) => {
            eprintln!("Warning: Failed to open log file in {:?}: {}", dir, e);
            None
        }
    }
}
