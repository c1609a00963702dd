//! Application configuration for [`LodestarApp`](super::LodestarApp).
//!
//! Combines the source selection with server and playback settings. The CLI
//! builds it from the config file overlaid with command-line flags.

use crate::config::ConfigFile;
use crate::generator::{PlaybackOptions, RouteEnd, SourceSpec};
use crate::server::ServerConfig;

/// Top-level configuration passed to `LodestarApp::start()`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Which position source to run, with its parameters.
    pub source: SourceSpec,

    /// Listening address, port and write timeout.
    pub server: ServerConfig,

    /// End-of-route behaviour for finite sources.
    pub playback: PlaybackOptions,

    /// Hold the stream until the first resume signal.
    pub wait_for_keypress: bool,
}

impl AppConfig {
    /// Defaults for everything but the source.
    pub fn new(source: SourceSpec) -> Self {
        Self {
            source,
            server: ServerConfig::default(),
            playback: PlaybackOptions::default(),
            wait_for_keypress: false,
        }
    }

    /// Server and playback settings taken from a loaded config file.
    pub fn from_config_file(source: SourceSpec, file: &ConfigFile) -> Self {
        Self {
            source,
            server: file.server_config(),
            playback: file.playback_options(),
            wait_for_keypress: file.playback.wait_for_keypress,
        }
    }

    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    pub fn with_route_end(mut self, route_end: RouteEnd) -> Self {
        self.playback.route_end = route_end;
        self
    }

    pub fn with_wait_for_keypress(mut self, enabled: bool) -> Self {
        self.wait_for_keypress = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.server.port = 10110;
        file.server.bind = IpAddr::V4(Ipv4Addr::LOCALHOST);
        file.playback.route_end = RouteEnd::Loop;
        file.playback.wait_for_keypress = true;

        let source = SourceSpec::parse("dynamic", Vec::<String>::new()).unwrap();
        let config = AppConfig::from_config_file(source, &file);
        assert_eq!(config.server.port, 10110);
        assert_eq!(config.playback.route_end, RouteEnd::Loop);
        assert!(config.wait_for_keypress);

        let config = config.with_route_end(RouteEnd::Stop).with_wait_for_keypress(false);
        assert_eq!(config.playback.route_end, RouteEnd::Stop);
        assert!(!config.wait_for_keypress);
    }
}
