//! Fix → RMC/GGA sentence encoding.

use chrono::{DateTime, Timelike, Utc};

use super::{frame, SentencePair, KMH_TO_KNOTS, MINUTE_DECIMALS, TALKER_ID};
use crate::fix::Fix;

// GGA fields the simulator does not model.
const GGA_SATELLITES: &str = "08";
const GGA_HDOP: &str = "1.0";
const GGA_GEOID_SEPARATION: &str = "0.0";

/// Encodes a fix into its RMC and GGA sentences.
pub fn encode(fix: &Fix) -> SentencePair {
    SentencePair {
        rmc: encode_rmc(fix),
        gga: encode_gga(fix),
    }
}

/// Recommended minimum sentence: time, status, position, speed, course, date.
pub fn encode_rmc(fix: &Fix) -> String {
    let (lat, ns) = format_latitude(fix.latitude);
    let (lon, ew) = format_longitude(fix.longitude);
    let body = format!(
        "{}RMC,{},A,{},{},{},{},{:.1},{:.1},{},,,A",
        TALKER_ID,
        format_time(&fix.timestamp),
        lat,
        ns,
        lon,
        ew,
        fix.speed_kmh * KMH_TO_KNOTS,
        fix.course,
        fix.timestamp.format("%d%m%y"),
    );
    frame(&body)
}

/// Fix data sentence: time, position, quality, altitude.
pub fn encode_gga(fix: &Fix) -> String {
    let (lat, ns) = format_latitude(fix.latitude);
    let (lon, ew) = format_longitude(fix.longitude);
    let body = format!(
        "{}GGA,{},{},{},{},{},{},{},{},{:.1},M,{},M,,",
        TALKER_ID,
        format_time(&fix.timestamp),
        lat,
        ns,
        lon,
        ew,
        fix.fix_quality,
        GGA_SATELLITES,
        GGA_HDOP,
        fix.elevation,
        GGA_GEOID_SEPARATION,
    );
    frame(&body)
}

/// Formats a latitude as `DDMM.mmmm` plus hemisphere letter.
pub fn format_latitude(lat: f64) -> (String, char) {
    debug_assert!((-90.0..=90.0).contains(&lat), "latitude {} out of range", lat);
    let hemisphere = if lat >= 0.0 { 'N' } else { 'S' };
    (format_dmm(lat, 2), hemisphere)
}

/// Formats a longitude as `DDDMM.mmmm` plus hemisphere letter.
pub fn format_longitude(lon: f64) -> (String, char) {
    debug_assert!(
        (-180.0..=180.0).contains(&lon),
        "longitude {} out of range",
        lon
    );
    let hemisphere = if lon >= 0.0 { 'E' } else { 'W' };
    (format_dmm(lon, 3), hemisphere)
}

/// Degrees + decimal minutes, rounded on the minute fraction with carry into
/// the degree part (59.99999' becomes the next whole degree).
fn format_dmm(value: f64, degree_width: usize) -> String {
    let scale = 10u64.pow(MINUTE_DECIMALS);
    let per_degree = 60 * scale;
    let total = (value.abs() * per_degree as f64).round() as u64;

    let degrees = total / per_degree;
    let remainder = total % per_degree;
    let minutes = remainder / scale;
    let fraction = remainder % scale;

    format!(
        "{:0dw$}{:02}.{:0fw$}",
        degrees,
        minutes,
        fraction,
        dw = degree_width,
        fw = MINUTE_DECIMALS as usize
    )
}

/// UTC time of day as `hhmmss.ss`.
fn format_time(ts: &DateTime<Utc>) -> String {
    // Leap seconds report nanos >= 1e9
    let centis = (ts.nanosecond() / 10_000_000).min(99);
    format!(
        "{:02}{:02}{:02}.{:02}",
        ts.hour(),
        ts.minute(),
        ts.second(),
        centis
    )
}
