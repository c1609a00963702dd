//! Error types for position sources and route loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a route or replay file.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The GeoJSON document is not valid JSON or not a FeatureCollection.
    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A GeoJSON feature is malformed (index is 1-based).
    #[error("Feature {index}: {reason}")]
    Feature { index: usize, reason: String },

    /// A CSV row is malformed (line is 1-based).
    #[error("Line {line}: {reason}")]
    Csv { line: usize, reason: String },

    /// The document contained no usable points.
    #[error("Route contains no points")]
    Empty,

    /// A replay file contained no decodable RMC/GGA sentence.
    #[error("No decodable RMC or GGA sentence in {0}")]
    NoDecodableSentences(PathBuf),
}

impl RouteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RouteError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration errors raised when building a position source.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// No factory is registered under this name.
    #[error("Unknown source '{name}' (available: {})", .known.join(", "))]
    UnknownSource { name: String, known: Vec<String> },

    /// A required positional parameter is absent.
    #[error("Source '{generator}' requires parameter <{parameter}>")]
    MissingParameter {
        generator: String,
        parameter: &'static str,
    },

    /// More positional parameters than the source accepts.
    #[error("Source '{generator}' takes {expected} positional parameter(s), got {actual}")]
    TooManyParameters {
        generator: String,
        expected: usize,
        actual: usize,
    },

    /// A keyword the source does not understand.
    #[error("Source '{generator}' does not accept '{keyword}=' (accepted: {})", .accepted.join(", "))]
    UnknownKeyword {
        generator: String,
        keyword: String,
        accepted: Vec<&'static str>,
    },

    /// A parameter value could not be parsed or is out of range.
    #[error("Invalid value '{value}' for '{parameter}' of source '{generator}': {reason}")]
    InvalidParameter {
        generator: String,
        parameter: String,
        value: String,
        reason: String,
    },

    /// Route or replay file failed to load.
    #[error("Failed to load route: {0}")]
    Route(#[from] RouteError),
}

impl GeneratorError {
    pub(crate) fn invalid(
        generator: &str,
        parameter: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        GeneratorError::InvalidParameter {
            generator: generator.to_string(),
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
