//! Synthetic circular motion.
//!
//! The receiver moves at constant speed around a circle whose center lies
//! `radius` km due south of the start point, so the start point sits at
//! bearing 0 from the center. Each tick advances the bearing by
//! `(speed × duration / 3600) / radius` radians and places the fix on the
//! circle with the great-circle direct formula.
//!
//! ```text
//!            start (θ = 0)
//!              ●──► course 90°
//!          ╱       ╲
//!         │    ✚    │   ✚ = center, `radius` km south of start
//!          ╲       ╱
//!            ─────
//! ```

use std::f64::consts::PI;
use std::time::Duration;

use chrono::Utc;

use super::error::GeneratorError;
use super::params::SourceParams;
use super::FixSource;
use crate::coord::{destination_point, normalize_angle, normalize_bearing, LatLon};
use crate::fix::{Fix, TransitionMode};

/// Registry name.
pub const NAME: &str = "dynamic";

/// Default speed in km/h.
pub const DEFAULT_SPEED_KMH: f64 = 10.0;

/// Default tick interval in seconds.
pub const DEFAULT_DURATION_SECS: f64 = 1.0;

/// Default circle radius in km.
pub const DEFAULT_RADIUS_KM: f64 = 0.1;

const KEYWORDS: &[&str] = &["speed", "duration", "radius", "transition", "elevation"];

/// Parameters of the circular motion model.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularMotionConfig {
    pub start: LatLon,
    pub speed_kmh: f64,
    pub duration: Duration,
    pub radius_km: f64,
    pub transition: TransitionMode,
    pub elevation: f64,
}

impl CircularMotionConfig {
    /// Defaults around the given start point.
    pub fn new(start: LatLon) -> Self {
        Self {
            start,
            speed_kmh: DEFAULT_SPEED_KMH,
            duration: Duration::from_secs_f64(DEFAULT_DURATION_SECS),
            radius_km: DEFAULT_RADIUS_KM,
            transition: TransitionMode::Auto,
            elevation: 0.0,
        }
    }

    /// Parses `<lat> <lon> [speed=] [duration=] [radius=] [transition=] [elevation=]`.
    pub fn from_params(params: &SourceParams) -> Result<Self, GeneratorError> {
        params.ensure_known(NAME, KEYWORDS, 2)?;

        let lat = params.required_f64(NAME, 0, "lat")?;
        let lon = params.required_f64(NAME, 1, "lon")?;
        let start = LatLon::new(lat, lon)
            .map_err(|e| GeneratorError::invalid(NAME, "start", format!("{lat} {lon}"), e.to_string()))?;

        let speed_kmh = params.keyword_f64(NAME, "speed", DEFAULT_SPEED_KMH)?;
        if speed_kmh < 0.0 {
            return Err(GeneratorError::invalid(NAME, "speed", speed_kmh, "must not be negative"));
        }

        let radius_km = params.keyword_f64(NAME, "radius", DEFAULT_RADIUS_KM)?;
        if radius_km <= 0.0 {
            return Err(GeneratorError::invalid(NAME, "radius", radius_km, "must be greater than 0"));
        }

        Ok(Self {
            start,
            speed_kmh,
            duration: params.keyword_duration(NAME, "duration", DEFAULT_DURATION_SECS)?,
            radius_km,
            transition: params.transition(NAME)?,
            elevation: params.keyword_f64(NAME, "elevation", 0.0)?,
        })
    }
}

/// Endless circular motion source.
#[derive(Debug, Clone)]
pub struct CircularMotion {
    config: CircularMotionConfig,
    center: LatLon,
    /// Bearing from the center, radians in [0, 2π).
    angle: f64,
    /// Bearing increment per tick, radians.
    step: f64,
    ticks: u64,
}

impl CircularMotion {
    pub fn new(config: CircularMotionConfig) -> Self {
        let center = destination_point(config.start, PI, config.radius_km);
        let arc_km = config.speed_kmh * config.duration.as_secs_f64() / 3600.0;
        let step = arc_km / config.radius_km;
        Self {
            config,
            center,
            angle: 0.0,
            step,
            ticks: 0,
        }
    }

    pub fn from_params(params: &SourceParams) -> Result<Self, GeneratorError> {
        CircularMotionConfig::from_params(params).map(Self::new)
    }

    pub fn center(&self) -> LatLon {
        self.center
    }

    /// Current bearing from the center in radians.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Bearing increment per tick in radians.
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn config(&self) -> &CircularMotionConfig {
        &self.config
    }
}

impl FixSource for CircularMotion {
    fn name(&self) -> &str {
        NAME
    }

    fn next_fix(&mut self) -> Option<Fix> {
        if self.ticks > 0 {
            self.angle = normalize_angle(self.angle + self.step);
        }
        self.ticks += 1;

        let position = destination_point(self.center, self.angle, self.config.radius_km);
        let course = normalize_bearing(self.angle.to_degrees() + 90.0);

        let mut fix = Fix::new(position.lat, position.lon, Utc::now())
            .with_speed(self.config.speed_kmh)
            .with_course(course)
            .with_elevation(self.config.elevation)
            .with_transition(self.config.transition, self.config.duration);
        fix.index = self.ticks;
        Some(fix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{distance_km, initial_bearing};

    fn params(args: &[&str]) -> SourceParams {
        SourceParams::parse(NAME, args).unwrap()
    }

    fn moscow(extra: &[&str]) -> CircularMotion {
        let mut args = vec!["55.7522", "37.6156"];
        args.extend_from_slice(extra);
        CircularMotion::from_params(&params(&args)).unwrap()
    }

    #[test]
    fn test_first_tick_is_start_point() {
        let mut source = moscow(&[]);
        let fix = source.next_fix().unwrap();
        assert!((fix.latitude - 55.7522).abs() < 1e-9);
        assert!((fix.longitude - 37.6156).abs() < 1e-9);
        assert!((fix.course - 90.0).abs() < 1e-9);
        assert_eq!(fix.index, 1);
    }

    #[test]
    fn test_step_matches_arc_over_radius() {
        let mut source = moscow(&["speed=36", "duration=2", "radius=0.5"]);
        // 36 km/h for 2 s = 0.02 km of arc on a 0.5 km circle
        assert!((source.step() - 0.04).abs() < 1e-12);
        source.next_fix();
        source.next_fix();
        assert!((source.angle() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_moscow_scenario_second_tick() {
        let mut source = moscow(&["speed=15", "duration=2", "radius=0.2"]);
        let center = source.center();
        // 15 km/h for 2 s covers 1/120 km of arc on a 0.2 km circle
        let expected = 15.0 * 2.0 / 3600.0 / 0.2;
        assert!((source.step() - expected).abs() < 1e-12);

        source.next_fix().unwrap();
        let second = source.next_fix().unwrap();
        assert_eq!(second.index, 2);
        assert!((source.angle() - expected).abs() < 1e-12);

        let radius = distance_km(center, second.position());
        assert!((radius - 0.2).abs() < 1e-6, "radius {}", radius);
        let bearing = initial_bearing(center, second.position());
        assert!((bearing - expected.to_degrees()).abs() < 1e-3, "bearing {}", bearing);
        assert!((second.course - (expected.to_degrees() + 90.0)).abs() < 1e-9);
    }

    #[test]
    fn test_every_fix_on_circle() {
        let mut source = moscow(&["speed=200", "radius=0.3"]);
        let center = source.center();
        for _ in 0..100 {
            let fix = source.next_fix().unwrap();
            let d = distance_km(center, fix.position());
            assert!((d - 0.3).abs() < 1e-6, "distance {} off circle", d);
        }
    }

    #[test]
    fn test_full_revolution_returns_to_start() {
        // Circumference 2π·0.1 km; pick speed so one revolution takes 8 ticks
        let circumference = 2.0 * PI * DEFAULT_RADIUS_KM;
        let speed = circumference / 8.0 * 3600.0;
        let speed_arg = format!("speed={}", speed);
        let mut source = moscow(&[speed_arg.as_str()]);
        let first = source.next_fix().unwrap();
        for _ in 0..7 {
            source.next_fix();
        }
        let again = source.next_fix().unwrap();
        assert!(distance_km(first.position(), again.position()) < 1e-6);
    }

    #[test]
    fn test_fix_carries_configuration() {
        let mut source = moscow(&["speed=15", "elevation=120.5", "transition=manual", "duration=3"]);
        let fix = source.next_fix().unwrap();
        assert_eq!(fix.speed_kmh, 15.0);
        assert_eq!(fix.elevation, 120.5);
        assert_eq!(fix.transition, TransitionMode::Manual);
        assert_eq!(fix.duration, Duration::from_secs(3));
    }

    #[test]
    fn test_zero_speed_stays_put() {
        let mut source = moscow(&["speed=0"]);
        let a = source.next_fix().unwrap();
        let b = source.next_fix().unwrap();
        assert_eq!(a.position(), b.position());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let cases: &[&[&str]] = &[
            &["55", "37", "radius=0"],
            &["55", "37", "radius=-1"],
            &["55", "37", "speed=-5"],
            &["55", "37", "duration=0"],
            &["55", "37", "duration=86401"],
            &["55", "37", "duration=1e30"],
            &["95", "37"],
            &["55", "181"],
            &["55"],
            &["55", "37", "altitude=3"],
        ];
        for args in cases {
            assert!(
                CircularMotion::from_params(&params(args)).is_err(),
                "accepted {:?}",
                args
            );
        }
    }

    #[test]
    fn test_longitude_normalized_near_antimeridian() {
        let mut source = CircularMotion::from_params(&params(&["0", "179.9995", "radius=0.1", "speed=360"])).unwrap();
        for _ in 0..20 {
            let fix = source.next_fix().unwrap();
            assert!((-180.0..=180.0).contains(&fix.longitude));
        }
    }
}
