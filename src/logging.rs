use crate::config::{LogRotation, LoggingConfig};
use std::fs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Rotation::MINUTELY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Directive applied on top of `RUST_LOG` for this crate
pub fn default_directive(level: &str) -> String {
    format!("lending_club_etl={}", level.trim().to_ascii_lowercase())
}

/// Initializes the logging system with both console and file output.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.dir)?;

    // Rolling JSON log file, oldest files pruned past max_files
    let file_appender = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(config.file_name.as_str())
        .max_log_files(config.max_files)
        .build(&config.dir)?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(default_directive(&config.level).parse()?))
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    // Logs are flushed by the worker for as long as the guard lives
    std::mem::forget(guard);
    Ok(())
}
