//! NMEA log replay.
//!
//! Decodes a recorded NMEA log into fixes and plays them back at a fixed
//! interval. Only RMC and GGA are understood; everything else is skipped with
//! a warning. An RMC followed directly by a GGA with the same time field is
//! merged into one fix (position and speed from RMC, elevation from GGA).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use super::error::{GeneratorError, RouteError};
use super::params::SourceParams;
use super::route::{PlaybackCursor, Route, RouteEnd};
use super::FixSource;
use crate::fix::{Fix, TransitionMode};
use crate::nmea::{merge_fixes, parse_sentence, NmeaError, RmcData, Sentence};

/// Registry name.
pub const NAME: &str = "nmea";

/// Default interval between replayed fixes in seconds.
pub const DEFAULT_DURATION_SECS: f64 = 1.0;

const KEYWORDS: &[&str] = &["duration", "index"];

/// A log line that could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    /// 1-based line number in the file.
    pub line: usize,
    pub error: NmeaError,
}

/// Result of decoding an NMEA log.
#[derive(Debug, Clone, Default)]
pub struct ReplayLog {
    pub fixes: Vec<Fix>,
    pub skipped: Vec<SkippedLine>,
}

/// Decodes every line of `text`, pacing the resulting fixes at `duration`.
///
/// Undecodable lines are logged and collected in [`ReplayLog::skipped`].
pub fn decode_log(text: &str, duration: Duration) -> ReplayLog {
    let mut log = ReplayLog::default();
    let mut pending: Option<RmcData> = None;

    let push = |log: &mut ReplayLog, fix: Fix| {
        let index = log.fixes.len() as u64 + 1;
        let mut fix = fix.with_transition(TransitionMode::Auto, duration);
        fix.index = index;
        log.fixes.push(fix);
    };

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse_sentence(line) {
            Ok(Sentence::Rmc(rmc)) => {
                if let Some(previous) = pending.replace(rmc) {
                    push(&mut log, previous.to_fix());
                }
            }
            Ok(Sentence::Gga(gga)) => match pending.take() {
                Some(rmc) if rmc.time_field == gga.time_field => {
                    push(&mut log, merge_fixes(&rmc, &gga));
                }
                previous => {
                    if let Some(rmc) = previous {
                        push(&mut log, rmc.to_fix());
                    }
                    push(&mut log, gga.to_fix(Utc::now().date_naive()));
                }
            },
            Err(error) => {
                warn!(line = i + 1, error = %error, "Skipping undecodable NMEA line");
                if let Some(rmc) = pending.take() {
                    push(&mut log, rmc.to_fix());
                }
                log.skipped.push(SkippedLine { line: i + 1, error });
            }
        }
    }

    if let Some(rmc) = pending {
        push(&mut log, rmc.to_fix());
    }
    log
}

/// Reads and decodes a log file; a file without any decodable sentence is an
/// error.
pub fn load_log(path: &Path, duration: Duration) -> Result<ReplayLog, RouteError> {
    let text = fs::read_to_string(path).map_err(|e| RouteError::io(path, e))?;
    let log = decode_log(&text, duration);
    if log.fixes.is_empty() {
        return Err(RouteError::NoDecodableSentences(PathBuf::from(path)));
    }
    info!(
        path = %path.display(),
        fixes = log.fixes.len(),
        skipped = log.skipped.len(),
        "Loaded NMEA log"
    );
    Ok(log)
}

/// Plays back decoded fixes, keeping their recorded timestamps.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    route: Route,
    cursor: PlaybackCursor,
}

impl ReplaySource {
    /// Starts playback at the 0-based fix `start`.
    pub fn new(fixes: Vec<Fix>, start: usize, end: RouteEnd) -> Result<Self, GeneratorError> {
        let route = Route::new(fixes)?;
        if start >= route.len() {
            return Err(GeneratorError::invalid(
                NAME,
                "index",
                start,
                format!("log has only {} fixes", route.len()),
            ));
        }
        let cursor = PlaybackCursor::new(route.len(), start, end);
        Ok(Self { route, cursor })
    }

    /// Parses `<file> [duration=] [index=]`.
    pub fn from_params(params: &SourceParams, end: RouteEnd) -> Result<Self, GeneratorError> {
        params.ensure_known(NAME, KEYWORDS, 1)?;
        let path = params.required(NAME, 0, "file")?;
        let duration = params.keyword_duration(NAME, "duration", DEFAULT_DURATION_SECS)?;
        let start = params.keyword_parse(NAME, "index", 0usize)?;

        let log = load_log(Path::new(path), duration)?;
        Self::new(log.fixes, start, end)
    }

    pub fn len(&self) -> usize {
        self.route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }
}

impl FixSource for ReplaySource {
    fn name(&self) -> &str {
        NAME
    }

    fn next_fix(&mut self) -> Option<Fix> {
        let index = self.cursor.advance()?;
        self.route.get(index).cloned()
    }
}
