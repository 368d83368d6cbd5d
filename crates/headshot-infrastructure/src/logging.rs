//! Shared tracing/logging initialization for the server and the CLI.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "headshot=info";
const LOG_FILE_PREFIX: &str = "headshot.log";

/// Keeps the file writer flushing. Hold it until shutdown.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- `RUST_LOG` value used when the env-var is not set.
/// * `log_json` -- emit JSON lines on stderr instead of the human format.
/// * `log_dir` -- when set, also write daily-rolling files there.
///
/// A second call is a no-op.
pub fn init_tracing(default_filter: &str, log_json: bool, log_dir: Option<&Path>) -> LogGuard {
    let env_filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );

    let stderr_layer = if log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    LogGuard { _file: file_guard }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_init_does_not_panic() {
        let temp_dir = TempDir::new().unwrap();
        let _first = init_tracing("headshot=debug", false, Some(temp_dir.path()));
        let _second = init_tracing("headshot=debug", true, None);
        tracing::info!("logged after double init");
    }
}
