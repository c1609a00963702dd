//! Configuration file handling for `~/.lodestar/config.ini`.
//!
//! Settings structs live in [`settings`], constants in [`defaults`], parsing
//! in `parser`, and file location/loading in `file`.
//!
//! ```ini
//! [server]
//! port = 5000
//! bind = 0.0.0.0
//! write_timeout_ms = 2000
//!
//! [playback]
//! route_end = stop
//! wait_for_keypress = false
//!
//! [logging]
//! file = ~/.lodestar/lodestar.log
//! ```
//!
//! A missing file yields the defaults; command-line flags override
//! individual values afterwards.

pub mod defaults;
mod file;
mod parser;
pub mod settings;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, LoggingSettings, PlaybackSettings, ServerSettings};
