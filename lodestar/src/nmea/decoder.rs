//! RMC/GGA sentence decoding.
//!
//! Validation order for every line: `$` prefix, `*hh` checksum, sentence type,
//! field count, then individual fields. Any failure is reported as an
//! [`NmeaError`] and never panics.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::{checksum, NmeaError, KNOTS_TO_KMH};
use crate::coord::LatLon;
use crate::fix::Fix;

/// Minimum field count (including the identifier) for RMC: up to the date.
const RMC_MIN_FIELDS: usize = 10;

/// Minimum field count (including the identifier) for GGA: up to the altitude.
const GGA_MIN_FIELDS: usize = 10;

/// A decoded position sentence.
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    Rmc(RmcData),
    Gga(GgaData),
}

impl Sentence {
    /// Raw `hhmmss.ss` time field, used to pair RMC and GGA of the same epoch.
    pub fn time_field(&self) -> &str {
        match self {
            Sentence::Rmc(rmc) => &rmc.time_field,
            Sentence::Gga(gga) => &gga.time_field,
        }
    }
}

/// Fields carried by an RMC sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct RmcData {
    pub time_field: String,
    pub timestamp: DateTime<Utc>,
    pub position: LatLon,
    pub speed_knots: f64,
    pub course: Option<f64>,
}

impl RmcData {
    /// Standalone fix (no elevation information).
    pub fn to_fix(&self) -> Fix {
        Fix::new(self.position.lat, self.position.lon, self.timestamp)
            .with_speed(self.speed_knots * KNOTS_TO_KMH)
            .with_course(self.course.unwrap_or(0.0))
    }
}

/// Fields carried by a GGA sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct GgaData {
    pub time_field: String,
    pub time: NaiveTime,
    pub position: LatLon,
    pub fix_quality: u8,
    pub satellites: Option<u8>,
    pub altitude: Option<f64>,
}

impl GgaData {
    /// Standalone fix on the given date (GGA carries no date of its own).
    pub fn to_fix(&self, date: NaiveDate) -> Fix {
        let timestamp = Utc.from_utc_datetime(&NaiveDateTime::new(date, self.time));
        let mut fix = Fix::new(self.position.lat, self.position.lon, timestamp)
            .with_elevation(self.altitude.unwrap_or(0.0));
        fix.fix_quality = self.fix_quality;
        fix
    }
}

/// Combines an RMC and a GGA of the same epoch into one fix.
///
/// Position, time, speed and course come from RMC; elevation and fix quality
/// from GGA.
pub fn merge_fixes(rmc: &RmcData, gga: &GgaData) -> Fix {
    let mut fix = rmc
        .to_fix()
        .with_elevation(gga.altitude.unwrap_or(0.0));
    fix.fix_quality = gga.fix_quality;
    fix
}

/// Parses one line into an RMC or GGA sentence.
pub fn parse_sentence(line: &str) -> Result<Sentence, NmeaError> {
    let body = checked_body(line)?;
    let fields: Vec<&str> = body.split(',').collect();

    match sentence_type(fields[0]) {
        Some("RMC") => parse_rmc(&fields).map(Sentence::Rmc),
        Some("GGA") => parse_gga(&fields).map(Sentence::Gga),
        _ => Err(NmeaError::UnsupportedSentence(fields[0].to_string())),
    }
}

/// Validates framing and checksum, returning the text between `$` and `*`.
fn checked_body(line: &str) -> Result<&str, NmeaError> {
    let line = line.trim_end();
    let rest = line.strip_prefix('$').ok_or(NmeaError::MissingStart)?;
    let star = rest.rfind('*').ok_or(NmeaError::MissingChecksum)?;
    let (body, declared) = (&rest[..star], &rest[star + 1..]);

    if declared.len() != 2 || !declared.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(NmeaError::MalformedChecksum(declared.to_string()));
    }
    let declared =
        u8::from_str_radix(declared, 16).map_err(|_| NmeaError::MalformedChecksum(declared.to_string()))?;
    let computed = checksum(body);
    if declared != computed {
        return Err(NmeaError::ChecksumMismatch { declared, computed });
    }
    Ok(body)
}

/// Strips the two-letter talker ID (`GPRMC` → `RMC`); bare `RMC` is accepted.
fn sentence_type(identifier: &str) -> Option<&str> {
    match identifier.len() {
        5 => identifier.get(2..),
        3 => Some(identifier),
        _ => None,
    }
}

fn parse_rmc(fields: &[&str]) -> Result<RmcData, NmeaError> {
    require_fields("RMC", fields, RMC_MIN_FIELDS)?;

    match fields[2] {
        "A" => {}
        "V" => return Err(NmeaError::NoFix("RMC")),
        other => return Err(NmeaError::invalid("status", other)),
    }

    let time = parse_time(fields[1])?;
    let date = parse_date(fields[9])?;
    let position = parse_position(fields[3], fields[4], fields[5], fields[6])?;
    let speed_knots = parse_optional_f64("speed", fields[7])?.unwrap_or(0.0);
    if speed_knots < 0.0 {
        return Err(NmeaError::invalid("speed", fields[7]));
    }
    let course = parse_optional_f64("course", fields[8])?;

    Ok(RmcData {
        time_field: fields[1].to_string(),
        timestamp: Utc.from_utc_datetime(&NaiveDateTime::new(date, time)),
        position,
        speed_knots,
        course,
    })
}

fn parse_gga(fields: &[&str]) -> Result<GgaData, NmeaError> {
    require_fields("GGA", fields, GGA_MIN_FIELDS)?;

    let fix_quality: u8 = fields[6]
        .parse()
        .map_err(|_| NmeaError::invalid("fix quality", fields[6]))?;
    if fix_quality == 0 {
        return Err(NmeaError::NoFix("GGA"));
    }

    let satellites = match fields[7] {
        "" => None,
        s => Some(s.parse().map_err(|_| NmeaError::invalid("satellites", s))?),
    };

    Ok(GgaData {
        time_field: fields[1].to_string(),
        time: parse_time(fields[1])?,
        position: parse_position(fields[2], fields[3], fields[4], fields[5])?,
        fix_quality,
        satellites,
        altitude: parse_optional_f64("altitude", fields[9])?,
    })
}

fn require_fields(sentence: &'static str, fields: &[&str], expected: usize) -> Result<(), NmeaError> {
    if fields.len() < expected {
        return Err(NmeaError::FieldCount {
            sentence,
            expected,
            actual: fields.len(),
        });
    }
    Ok(())
}

fn parse_position(lat: &str, ns: &str, lon: &str, ew: &str) -> Result<LatLon, NmeaError> {
    let latitude = match ns {
        "N" => parse_dmm("latitude", lat)?,
        "S" => -parse_dmm("latitude", lat)?,
        other => return Err(NmeaError::invalid("latitude hemisphere", other)),
    };
    let longitude = match ew {
        "E" => parse_dmm("longitude", lon)?,
        "W" => -parse_dmm("longitude", lon)?,
        other => return Err(NmeaError::invalid("longitude hemisphere", other)),
    };
    LatLon::new(latitude, longitude).map_err(|_| NmeaError::InvalidField {
        field: "position",
        value: format!("{},{},{},{}", lat, ns, lon, ew),
    })
}

/// Parses `DDMM.mmmm` / `DDDMM.mmmm`: the two digits before the decimal point
/// are whole minutes, everything before them is degrees.
fn parse_dmm(field: &'static str, value: &str) -> Result<f64, NmeaError> {
    let point = value.find('.').unwrap_or(value.len());
    if point < 3 || !value.is_ascii() {
        return Err(NmeaError::invalid(field, value));
    }
    let (degrees, minutes) = value.split_at(point - 2);
    let degrees: u32 = degrees
        .parse()
        .map_err(|_| NmeaError::invalid(field, value))?;
    let minutes: f64 = minutes
        .parse()
        .map_err(|_| NmeaError::invalid(field, value))?;
    if !(0.0..60.0).contains(&minutes) {
        return Err(NmeaError::invalid(field, value));
    }
    Ok(degrees as f64 + minutes / 60.0)
}

/// Parses `hhmmss[.sss]`.
fn parse_time(value: &str) -> Result<NaiveTime, NmeaError> {
    let invalid = || NmeaError::invalid("time", value);
    if value.len() < 6 || !value.is_ascii() {
        return Err(invalid());
    }
    let hour: u32 = value[0..2].parse().map_err(|_| invalid())?;
    let minute: u32 = value[2..4].parse().map_err(|_| invalid())?;
    let second: u32 = value[4..6].parse().map_err(|_| invalid())?;

    let nanos = match &value[6..] {
        "" => 0,
        frac => {
            let digits = frac.strip_prefix('.').ok_or_else(invalid)?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let seconds: f64 = format!("0.{}", digits).parse().map_err(|_| invalid())?;
            ((seconds * 1e9).round() as u32).min(999_999_999)
        }
    };

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos).ok_or_else(invalid)
}

/// Parses `ddmmyy` (years are 2000-based).
fn parse_date(value: &str) -> Result<NaiveDate, NmeaError> {
    let invalid = || NmeaError::invalid("date", value);
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let day: u32 = value[0..2].parse().map_err(|_| invalid())?;
    let month: u32 = value[2..4].parse().map_err(|_| invalid())?;
    let year: i32 = value[4..6].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(2000 + year, month, day).ok_or_else(invalid)
}

fn parse_optional_f64(field: &'static str, value: &str) -> Result<Option<f64>, NmeaError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| NmeaError::invalid(field, value))
}
