//! NMEA 0183 codec
//!
//! Encodes fixes into checksummed RMC/GGA sentence pairs for the wire, and
//! decodes RMC/GGA sentences back into fixes for the replay source.
//!
//! # Wire Format
//!
//! ```text
//! $GPRMC,hhmmss.ss,A,DDMM.mmmm,N,DDDMM.mmmm,E,kn,course,ddmmyy,,,A*hh\r\n
//! $GPGGA,hhmmss.ss,DDMM.mmmm,N,DDDMM.mmmm,E,q,08,1.0,alt,M,0.0,M,,*hh\r\n
//! ```
//!
//! The checksum is the XOR of every byte strictly between `$` and `*`,
//! rendered as two uppercase hex digits.
//!
//! # Example
//!
//! ```ignore
//! use lodestar::nmea::{encode, parse_sentence};
//!
//! let pair = encode(&fix);
//! let decoded = parse_sentence(&pair.rmc)?;
//! ```

mod decoder;
mod encoder;
mod error;

pub use decoder::{merge_fixes, parse_sentence, GgaData, RmcData, Sentence};
pub use encoder::{encode, encode_gga, encode_rmc, format_latitude, format_longitude};
pub use error::NmeaError;

/// Talker ID prefixed to every generated sentence.
pub const TALKER_ID: &str = "GP";

/// Conversion factor: kilometers per hour to knots.
pub const KMH_TO_KNOTS: f64 = 0.539957;

/// Conversion factor: knots to kilometers per hour.
pub const KNOTS_TO_KMH: f64 = 1.852;

/// Decimal places used for the minutes part of DMM coordinates.
pub const MINUTE_DECIMALS: u32 = 4;

/// XOR of all bytes in `body` (the text strictly between `$` and `*`).
#[inline]
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Wraps a sentence body into a complete CRLF-terminated sentence.
pub fn frame(body: &str) -> String {
    format!("${}*{:02X}\r\n", body, checksum(body))
}

/// The two sentences emitted for one fix, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentencePair {
    pub rmc: String,
    pub gga: String,
}

impl SentencePair {
    /// Bytes written to each client for one tick (RMC then GGA).
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.rmc.len() + self.gga.len());
        buf.extend_from_slice(self.rmc.as_bytes());
        buf.extend_from_slice(self.gga.as_bytes());
        buf
    }
}
