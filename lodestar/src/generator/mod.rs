//! Position sources.
//!
//! A position source produces one [`Fix`] per tick. The built-in sources form
//! a closed set ([`PositionSource`]); additional sources can be plugged in
//! through the [`GeneratorRegistry`] as [`FixSource`] trait objects.
//!
//! | Name      | Source                 | Parameters                                   |
//! |-----------|------------------------|----------------------------------------------|
//! | `dynamic` | [`CircularMotion`]     | `lat lon [speed= duration= radius= transition= elevation=]` |
//! | `geojson` | [`RouteSource`]        | `file [index=]`                              |
//! | `csv`     | [`RouteSource`]        | `file [index=]`                              |
//! | `nmea`    | [`ReplaySource`]       | `file [duration= index=]`                    |
//!
//! # Example
//!
//! ```ignore
//! use lodestar::generator::{GeneratorRegistry, PlaybackOptions, SourceSpec};
//!
//! let registry = GeneratorRegistry::with_builtins();
//! let spec = SourceSpec::parse("dynamic", ["55.7522", "37.6156", "speed=30"])?;
//! let mut source = registry.create(&spec, &PlaybackOptions::default())?;
//!
//! while let Some(fix) = source.next_fix() {
//!     // encode and broadcast
//! }
//! ```

pub mod csv;
pub mod dynamic;
mod error;
pub mod geojson;
mod params;
mod registry;
pub mod replay;
pub mod route;

pub use dynamic::{CircularMotion, CircularMotionConfig};
pub use error::{GeneratorError, RouteError};
pub use params::{SourceParams, SourceSpec};
pub use registry::{GeneratorRegistry, SourceFactory};
pub use replay::{ReplayLog, ReplaySource, SkippedLine};
pub use route::{Route, RouteEnd, RouteSource};

use crate::fix::Fix;

/// A producer of fixes, one per tick.
///
/// Returning `None` ends the stream.
pub trait FixSource: Send {
    /// Registry name of the source.
    fn name(&self) -> &str;

    /// Produces the next fix.
    fn next_fix(&mut self) -> Option<Fix>;
}

/// Playback options that apply to every source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// What finite sources do after their last point.
    pub route_end: RouteEnd,
}

/// The active position source.
pub enum PositionSource {
    Dynamic(CircularMotion),
    Route(RouteSource),
    Replay(ReplaySource),
    /// A source added through [`GeneratorRegistry::register`].
    External(Box<dyn FixSource>),
}

impl FixSource for PositionSource {
    fn name(&self) -> &str {
        match self {
            PositionSource::Dynamic(s) => s.name(),
            PositionSource::Route(s) => s.name(),
            PositionSource::Replay(s) => s.name(),
            PositionSource::External(s) => s.name(),
        }
    }

    fn next_fix(&mut self) -> Option<Fix> {
        match self {
            PositionSource::Dynamic(s) => s.next_fix(),
            PositionSource::Route(s) => s.next_fix(),
            PositionSource::Replay(s) => s.next_fix(),
            PositionSource::External(s) => s.next_fix(),
        }
    }
}

impl std::fmt::Debug for PositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PositionSource").field(&self.name()).finish()
    }
}
