//! Settings structs, one per `[section]` of the INI file.
//!
//! These are pure data types with no parsing logic.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::generator::{PlaybackOptions, RouteEnd};
use crate::server::ServerConfig;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Playback settings
    pub playback: PlaybackSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// TCP port clients connect to
    pub port: u16,
    /// Bind address
    pub bind: IpAddr,
    /// Per-client write timeout in milliseconds
    pub write_timeout_ms: u64,
}

/// `[playback]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// What finite routes do after the last point
    pub route_end: RouteEnd,
    /// Hold the stream until the first keypress
    pub wait_for_keypress: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl ConfigFile {
    /// Server configuration derived from the `[server]` section.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.server.bind,
            port: self.server.port,
            write_timeout: Duration::from_millis(self.server.write_timeout_ms),
        }
    }

    /// Playback options derived from the `[playback]` section.
    pub fn playback_options(&self) -> PlaybackOptions {
        PlaybackOptions {
            route_end: self.playback.route_end,
        }
    }
}
