use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Installs the process subscriber: daily rolling file under `log_dir`,
/// level from `RUST_LOG` or else `log_level`.
///
/// Keep the returned guard alive for as long as the server runs, dropping it
/// flushes and stops the background writer.
pub fn init(config: &Config) -> WorkerGuard {
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    guard
}
