//! Core fix types shared by every stage of the pipeline.
//!
//! - [`TransitionMode`] - How playback advances past a point
//! - [`Fix`] - One instantaneous position/velocity/time sample

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::coord::LatLon;

/// Default GGA fix quality (1 = GPS fix).
pub const DEFAULT_FIX_QUALITY: u8 = 1;

/// Per-point pacing policy.
///
/// `Manual` and `Key` share the same wait-for-resume behavior; both names are
/// accepted because route files in the wild use either spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionMode {
    /// Hold the point for its duration, then advance automatically.
    #[default]
    Auto,
    /// Hold the point until the operator resumes playback.
    Manual,
    /// Alias of `Manual`.
    Key,
}

impl TransitionMode {
    /// Returns true if this mode suspends playback until a resume signal.
    #[inline]
    pub fn waits_for_resume(&self) -> bool {
        !matches!(self, TransitionMode::Auto)
    }

    /// Lowercase name as written in route files.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionMode::Auto => "auto",
            TransitionMode::Manual => "manual",
            TransitionMode::Key => "key",
        }
    }
}

impl fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a transition name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown transition mode '{0}' (expected auto, manual or key)")]
pub struct ParseTransitionError(pub String);

impl FromStr for TransitionMode {
    type Err = ParseTransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(TransitionMode::Auto),
            "manual" => Ok(TransitionMode::Manual),
            "key" => Ok(TransitionMode::Key),
            other => Err(ParseTransitionError(other.to_string())),
        }
    }
}

/// A single point in the output stream.
///
/// Fixes are produced by exactly one position source per tick and are never
/// mutated afterwards; the encoder and renderer only read them.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// 1-based point number within the stream.
    pub index: u64,
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Speed over ground in km/h.
    pub speed_kmh: f64,
    /// Course over ground in degrees true.
    pub course: f64,
    /// Elevation above mean sea level in meters.
    pub elevation: f64,
    /// UTC time of the fix.
    pub timestamp: DateTime<Utc>,
    /// GGA fix quality indicator.
    pub fix_quality: u8,
    /// Free-form label shown by the renderer.
    pub description: Option<String>,
    /// How playback advances past this point.
    pub transition: TransitionMode,
    /// Hold time for `Auto` transitions.
    pub duration: Duration,
}

impl Fix {
    /// Create a fix at the given position with defaults for everything else.
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            index: 0,
            latitude,
            longitude,
            speed_kmh: 0.0,
            course: 0.0,
            elevation: 0.0,
            timestamp,
            fix_quality: DEFAULT_FIX_QUALITY,
            description: None,
            transition: TransitionMode::Auto,
            duration: Duration::ZERO,
        }
    }

    /// Position as a coordinate pair.
    #[inline]
    pub fn position(&self) -> LatLon {
        LatLon {
            lat: self.latitude,
            lon: self.longitude,
        }
    }

    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = speed_kmh;
        self
    }

    pub fn with_course(mut self, course: f64) -> Self {
        self.course = course;
        self
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn with_transition(mut self, transition: TransitionMode, duration: Duration) -> Self {
        self.transition = transition;
        self.duration = duration;
        self
    }

    /// Copy of this fix re-stamped for emission.
    pub fn emitted(&self, index: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            index,
            timestamp,
            ..self.clone()
        }
    }
}

/// Longest hold accepted for a single point (one day).
pub const MAX_DURATION_SECS: f64 = 86_400.0;

/// Parses a duration in seconds within `0..=MAX_DURATION_SECS`.
pub(crate) fn duration_from_secs(secs: f64) -> Option<Duration> {
    if !(0.0..=MAX_DURATION_SECS).contains(&secs) {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}
