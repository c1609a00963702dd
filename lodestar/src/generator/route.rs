//! Route-backed playback.
//!
//! A [`Route`] is an ordered, non-empty list of fix templates loaded once at
//! startup. [`RouteSource`] walks it with a cursor and re-stamps each point
//! with the current time as it is emitted. What happens after the last point
//! is controlled by [`RouteEnd`].

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use tracing::debug;

use super::error::RouteError;
use super::FixSource;
use crate::coord::initial_bearing;
use crate::fix::Fix;

// =============================================================================
// Route
// =============================================================================

/// Ordered, finite, non-empty sequence of fix templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<Fix>,
}

impl Route {
    /// Wraps points as-is (courses already known, e.g. decoded from RMC).
    pub fn new(points: Vec<Fix>) -> Result<Self, RouteError> {
        if points.is_empty() {
            return Err(RouteError::Empty);
        }
        Ok(Self { points })
    }

    /// Builds a route from waypoints, deriving each course as the initial
    /// great-circle bearing to the following point. The last point keeps the
    /// course of the leg leading into it.
    pub fn from_waypoints(mut points: Vec<Fix>) -> Result<Self, RouteError> {
        if points.is_empty() {
            return Err(RouteError::Empty);
        }

        let mut previous = 0.0;
        for i in 0..points.len() {
            let course = match points.get(i + 1) {
                Some(next) => initial_bearing(points[i].position(), next.position()),
                None => previous,
            };
            points[i].course = course;
            previous = course;
        }

        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Fix] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&Fix> {
        self.points.get(index)
    }
}

// =============================================================================
// End-of-route policy
// =============================================================================

/// Behaviour once the last point of a route has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteEnd {
    /// End the stream; playback stops.
    #[default]
    Stop,
    /// Restart from the first point.
    Loop,
    /// Keep re-emitting the last point.
    Hold,
}

impl RouteEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteEnd::Stop => "stop",
            RouteEnd::Loop => "loop",
            RouteEnd::Hold => "hold",
        }
    }
}

impl fmt::Display for RouteEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteEnd {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stop" => Ok(RouteEnd::Stop),
            "loop" => Ok(RouteEnd::Loop),
            "hold" => Ok(RouteEnd::Hold),
            other => Err(format!(
                "unknown route end '{}' (expected stop, loop or hold)",
                other
            )),
        }
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Position within a route, shared by route and replay playback.
#[derive(Debug, Clone)]
pub(crate) struct PlaybackCursor {
    len: usize,
    next: usize,
    end: RouteEnd,
    finished: bool,
}

impl PlaybackCursor {
    /// Starts at `start`, which must be below `len`.
    pub(crate) fn new(len: usize, start: usize, end: RouteEnd) -> Self {
        debug_assert!(start < len);
        Self {
            len,
            next: start,
            end,
            finished: false,
        }
    }

    /// Index of the point to emit next, or `None` once playback is over.
    pub(crate) fn advance(&mut self) -> Option<usize> {
        if self.finished {
            return None;
        }
        if self.next < self.len {
            let index = self.next;
            self.next += 1;
            return Some(index);
        }
        match self.end {
            RouteEnd::Stop => {
                self.finished = true;
                None
            }
            RouteEnd::Loop => {
                debug!(points = self.len, "Route finished, restarting from first point");
                self.next = 1;
                Some(0)
            }
            RouteEnd::Hold => Some(self.len - 1),
        }
    }
}

// =============================================================================
// Route source
// =============================================================================

/// Plays a [`Route`] point by point.
#[derive(Debug, Clone)]
pub struct RouteSource {
    name: &'static str,
    route: Route,
    cursor: PlaybackCursor,
}

impl RouteSource {
    /// Creates a source starting at the first point.
    pub fn new(name: &'static str, route: Route, end: RouteEnd) -> Self {
        let cursor = PlaybackCursor::new(route.len(), 0, end);
        Self {
            name,
            route,
            cursor,
        }
    }

    /// Creates a source starting at the 0-based point `start`.
    ///
    /// Returns `None` if `start` is past the end of the route.
    pub fn starting_at(name: &'static str, route: Route, start: usize, end: RouteEnd) -> Option<Self> {
        if start >= route.len() {
            return None;
        }
        let cursor = PlaybackCursor::new(route.len(), start, end);
        Some(Self {
            name,
            route,
            cursor,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }
}

impl FixSource for RouteSource {
    fn name(&self) -> &str {
        self.name
    }

    fn next_fix(&mut self) -> Option<Fix> {
        let index = self.cursor.advance()?;
        self.route
            .get(index)
            .map(|template| template.emitted(index as u64 + 1, Utc::now()))
    }
}
