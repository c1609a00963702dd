//! CSV route loading.
//!
//! ```text
//! point_number,latitude,longitude,speed,elevation[,duration[,transition[,description]]]
//! 1,55.7522,37.6156,10.0,120.5,2.0,auto,"Moscow, center"
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. The first data line is
//! treated as a header only if none of its five required columns is numeric.

use std::fs;
use std::path::Path;

use chrono::Utc;

use super::error::RouteError;
use super::route::Route;
use crate::coord::LatLon;
use crate::fix::{duration_from_secs, Fix, TransitionMode, MAX_DURATION_SECS};

/// Registry name.
pub const NAME: &str = "csv";

/// Minimum number of columns per row.
pub const MIN_COLUMNS: usize = 5;

/// Default hold time when the duration column is absent or empty.
pub const DEFAULT_DURATION_SECS: f64 = 1.0;

/// Reads and parses a CSV route file.
pub fn load_csv(path: &Path) -> Result<Route, RouteError> {
    let text = fs::read_to_string(path).map_err(|e| RouteError::io(path, e))?;
    parse_csv(&text)
}

/// Parses CSV text into a route.
pub fn parse_csv(text: &str) -> Result<Route, RouteError> {
    let mut points = Vec::new();
    let mut seen_data = false;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fail = |reason: String| RouteError::Csv {
            line: line_no,
            reason,
        };
        let fields = split_fields(line).map_err(fail)?;

        if !seen_data {
            seen_data = true;
            if is_header(&fields) {
                continue;
            }
        }

        points.push(parse_row(&fields).map_err(fail)?);
    }

    Route::from_waypoints(points)
}

/// A header row has at least the required columns and none of them is numeric.
fn is_header(fields: &[String]) -> bool {
    fields.len() >= MIN_COLUMNS
        && fields[..MIN_COLUMNS]
            .iter()
            .all(|f| f.trim().parse::<f64>().is_err())
}

fn parse_row(fields: &[String]) -> Result<Fix, String> {
    if fields.len() < MIN_COLUMNS {
        return Err(format!(
            "expected at least {} columns, found {}",
            MIN_COLUMNS,
            fields.len()
        ));
    }

    let lat = number(fields, 1, "latitude")?;
    let lon = number(fields, 2, "longitude")?;
    let position = LatLon::new(lat, lon).map_err(|e| e.to_string())?;

    let speed = number(fields, 3, "speed")?;
    if speed < 0.0 {
        return Err(format!("speed {} must not be negative", speed));
    }
    let elevation = number(fields, 4, "elevation")?;

    let secs = match optional(fields, 5) {
        Some(_) => number(fields, 5, "duration")?,
        None => DEFAULT_DURATION_SECS,
    };
    let duration =
        duration_from_secs(secs).ok_or_else(|| format!("duration {} must be between 0 and {} seconds", secs, MAX_DURATION_SECS))?;

    let transition: TransitionMode = match optional(fields, 6) {
        Some(s) => s.parse().map_err(|e| format!("{}", e))?,
        None => TransitionMode::Auto,
    };
    let description = optional(fields, 7).unwrap_or_default();

    Ok(Fix::new(position.lat, position.lon, Utc::now())
        .with_speed(speed)
        .with_elevation(elevation)
        .with_transition(transition, duration)
        .with_description(description))
}

fn number(fields: &[String], index: usize, name: &str) -> Result<f64, String> {
    let raw = fields[index].trim();
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid {} '{}'", name, raw))
}

/// Trimmed, non-empty column value.
fn optional(fields: &[String], index: usize) -> Option<&str> {
    fields
        .get(index)
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
}

/// Splits one line on commas, honouring double-quoted fields.
///
/// Inside quotes a doubled quote (`""`) is a literal quote.
fn split_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}
