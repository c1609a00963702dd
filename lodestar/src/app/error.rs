//! Application error types.

use std::fmt;

use crate::config::ConfigFileError;
use crate::generator::GeneratorError;
use crate::server::ServerError;

/// Errors that can occur while starting the simulator.
///
/// All of these are fatal and happen before the first fix is emitted.
#[derive(Debug)]
pub enum AppError {
    /// The position source could not be built (unknown name, bad parameter,
    /// unreadable route file).
    Source(GeneratorError),

    /// The broadcast server could not be started.
    Server(ServerError),

    /// The config file could not be read or holds an invalid value.
    Config(ConfigFileError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Source(e) => write!(f, "Invalid position source: {}", e),
            AppError::Server(e) => write!(f, "Failed to start NMEA server: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Source(e) => Some(e),
            AppError::Server(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

impl From<GeneratorError> for AppError {
    fn from(e: GeneratorError) -> Self {
        AppError::Source(e)
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::Config(e)
    }
}

impl From<ServerError> for AppError {
    fn from(e: ServerError) -> Self {
        AppError::Server(e)
    }
}
