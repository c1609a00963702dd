//! CLI runner for common setup.
//!
//! Encapsulates config loading and logging initialization.

use std::path::Path;

use tracing::info;

use lodestar::config::ConfigFile;
use lodestar::logging::{init_logging, LoggingGuard, LoggingOptions};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Whether the live point table owns the terminal
    display: bool,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// The point table is only drawn when stdout is a TTY; stdout logging is
    /// enabled exactly when the table is not, so log lines never corrupt it.
    pub fn new(config_path: Option<&Path>, debug_mode: bool, no_display: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let display = !no_display && atty::is(atty::Stream::Stdout);
        let options = LoggingOptions {
            stdout: !display,
            debug: debug_mode,
        };

        let logging_guard = init_logging(&config.logging.file, options)
            .map_err(|e| CliError::LoggingInit(format!("{}: {}", config.logging.file.display(), e)))?;

        Ok(Self {
            logging_guard,
            config,
            display,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// True when the console renderer should draw the point table.
    pub fn display_enabled(&self) -> bool {
        self.display
    }

    /// Log startup information.
    pub fn log_startup(&self) {
        info!("Lodestar v{}", lodestar::VERSION);
        info!(
            log_file = %self.config.logging.file.display(),
            display = self.display,
            "Lodestar CLI starting"
        );
    }
}
