//! Logging setup
//!
//! Console output in the configured format, plus an optional log file in
//! `log_dir` written through a non-blocking appender. `RUST_LOG` overrides
//! the configured verbosity.

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

/// Environment variable naming the default log directory
pub const LOG_DIR_ENV: &str = "GUEST_CLIPBOARD_LOG_DIR";

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "guest-clipboard.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Map 0-4 verbosity onto a level; anything above 4 is trace
pub fn verbosity_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn console_layer(format: &str) -> BoxedLayer {
    match format {
        "json" => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        "compact" => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
        _ => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the file writer.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level = verbosity_level(config.verbosity);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(&config.format)];
    let mut guard = None;

    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);

        let file_layer = match config.format.as_str() {
            "json" => fmt::layer().json().with_writer(writer).with_ansi(false).boxed(),
            _ => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
        };
        layers.push(file_layer);
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(dir) = &config.log_dir {
        info!("Logging to file: {}", dir.join(LOG_FILE_NAME).display());
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(verbosity_level(0), Level::ERROR);
        assert_eq!(verbosity_level(1), Level::WARN);
        assert_eq!(verbosity_level(2), Level::INFO);
        assert_eq!(verbosity_level(3), Level::DEBUG);
        assert_eq!(verbosity_level(4), Level::TRACE);
        assert_eq!(verbosity_level(200), Level::TRACE);
    }
}
