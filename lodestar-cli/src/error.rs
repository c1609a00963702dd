//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use lodestar::app::AppError;
use lodestar::config::ConfigFileError;
use lodestar::generator::GeneratorError;
use lodestar::server::ServerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to start the simulator
    App(AppError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::App(AppError::Source(GeneratorError::UnknownSource { .. })) => {
                eprintln!();
                eprintln!("Usage: lodestar [PORT] --source <NAME> [PARAMS]...");
                eprintln!("  dynamic <lat> <lon> [speed=] [duration=] [radius=] [transition=] [elevation=]");
                eprintln!("  geojson <file> [index=]");
                eprintln!("  csv <file> [index=]");
                eprintln!("  nmea <file> [duration=] [index=]");
            }
            CliError::App(AppError::Server(ServerError::Bind { .. })) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Port in use: another simulator or GPS daemon is already listening");
                eprintln!("  2. Ports below 1024 need elevated privileges");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::App(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::App(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<GeneratorError> for CliError {
    fn from(e: GeneratorError) -> Self {
        CliError::App(AppError::Source(e))
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::App(AppError::Config(e))
    }
}
