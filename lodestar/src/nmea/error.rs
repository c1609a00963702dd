//! Error types for NMEA sentence decoding.

use thiserror::Error;

/// Reasons a single sentence cannot be decoded.
///
/// These are always recoverable: the replay source logs them and moves on to
/// the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NmeaError {
    /// Line does not start with `$`.
    #[error("Sentence does not start with '$'")]
    MissingStart,

    /// No `*hh` checksum suffix.
    #[error("Sentence has no checksum")]
    MissingChecksum,

    /// Checksum suffix is not two hex digits.
    #[error("Malformed checksum field '{0}'")]
    MalformedChecksum(String),

    /// Declared and computed checksums differ.
    #[error("Checksum mismatch: declared {declared:02X}, computed {computed:02X}")]
    ChecksumMismatch { declared: u8, computed: u8 },

    /// Sentence type other than RMC/GGA.
    #[error("Unsupported sentence type '{0}'")]
    UnsupportedSentence(String),

    /// Too few comma-separated fields for the sentence type.
    #[error("{sentence} sentence has {actual} fields, expected at least {expected}")]
    FieldCount {
        sentence: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A field could not be parsed.
    #[error("Invalid {field} field '{value}'")]
    InvalidField { field: &'static str, value: String },

    /// Receiver reported no valid fix (RMC status V or GGA quality 0).
    #[error("{0} sentence reports no valid fix")]
    NoFix(&'static str),
}

impl NmeaError {
    pub(crate) fn invalid(field: &'static str, value: &str) -> Self {
        NmeaError::InvalidField {
            field,
            value: value.to_string(),
        }
    }
}
