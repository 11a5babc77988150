use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::HookshotError;

const DEFAULT_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "hookshot";

pub struct FileLogger {
    log_directory: PathBuf,
    rotation: Rotation,
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            rotation: Rotation::DAILY,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard), HookshotError> {
        // Ensure log directory exists
        std::fs::create_dir_all(&self.log_directory)?;

        let file_appender = RollingFileAppender::new(
            self.rotation.clone(),
            &self.log_directory,
            LOG_FILE_PREFIX,
        );
        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// Console logging filtered by `RUST_LOG`, plus a rolling file when
/// `file_logger` is given. Keep the returned guard alive to flush file output.
pub fn setup_logging(file_logger: Option<&FileLogger>) -> Result<Option<WorkerGuard>, HookshotError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, guard) = match file_logger {
        Some(logger) => {
            let (writer, guard) = logger.setup_file_logging()?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false); // Disable ANSI colors for file logs
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer()) // Console output
        .with(file_layer)
        .try_init()
        .map_err(|e| HookshotError::ConfigError(format!("Failed to initialise logging: {}", e)))?;

    Ok(guard)
}
