//! # repomon-logging
//!
//! Tracing setup for repomon.
//!
//! Console output in pretty or JSON form, plus an optional daily-rolling
//! log file under the platform data directory. The returned guard must be
//! held for the lifetime of the process or buffered file output is lost.
//!
//! Verbose git logging (every command with its wall-clock time) is the
//! TRACE level of the `repomon_git` target, e.g. `--log-level
//! repomon_git=trace`.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

/// Directory the rolling log file is written to when file logging is on.
pub fn log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("repomon")
}

/// Initialize tracing for the application.
///
/// `level` is an `EnvFilter` directive string and is overridden by
/// `RUST_LOG` when set.
pub fn init_tracing(level: &str, format: LogFormat, log_to_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![filter.boxed()];

    match format {
        LogFormat::Json => {
            layers.push(fmt::layer().json().with_target(false).boxed());
        }
        LogFormat::Pretty | LogFormat::Compact => {
            layers.push(fmt::layer().with_target(false).boxed());
        }
    }

    let guard = if log_to_file {
        let appender = tracing_appender::rolling::daily(log_dir(), "repomon.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry().with(layers).init();
    guard
}
