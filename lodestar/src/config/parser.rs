//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::net::IpAddr;
use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::generator::RouteEnd;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("port") {
            config.server.port = v.trim().parse().map_err(|_| {
                invalid("server", "port", v, "must be an integer between 0 and 65535")
            })?;
        }
        if let Some(v) = section.get("bind") {
            config.server.bind = v
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| invalid("server", "bind", v, "must be an IPv4 or IPv6 address"))?;
        }
        if let Some(v) = section.get("write_timeout_ms") {
            let parsed: u64 = v.trim().parse().map_err(|_| {
                invalid("server", "write_timeout_ms", v, "must be a positive integer (milliseconds)")
            })?;
            if parsed == 0 {
                return Err(invalid(
                    "server",
                    "write_timeout_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                ));
            }
            config.server.write_timeout_ms = parsed;
        }
    }

    // [playback] section
    if let Some(section) = ini.section(Some("playback")) {
        if let Some(v) = section.get("route_end") {
            config.playback.route_end = v
                .trim()
                .parse::<RouteEnd>()
                .map_err(|_| invalid("playback", "route_end", v, "must be one of: stop, loop, hold"))?;
        }
        if let Some(v) = section.get("wait_for_keypress") {
            config.playback.wait_for_keypress = parse_bool(v).ok_or_else(|| {
                invalid("playback", "wait_for_keypress", v, "must be true or false")
            })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a boolean value (true/1/yes/on, false/0/no/off).
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expand ~ to home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
