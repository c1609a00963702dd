//! Default values for all configuration settings and the
//! `ConfigFile::default()` implementation.

use super::file::config_directory;
use super::settings::*;
use crate::generator::RouteEnd;
use crate::server::{DEFAULT_BIND, DEFAULT_PORT, DEFAULT_WRITE_TIMEOUT};

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "lodestar.log";

/// Default per-client write timeout in milliseconds.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = DEFAULT_WRITE_TIMEOUT.as_millis() as u64;

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            route_end: RouteEnd::Stop,
            wait_for_keypress: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: config_directory().join(DEFAULT_LOG_FILE_NAME),
        }
    }
}
