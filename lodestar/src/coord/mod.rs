//! Geographic coordinate helpers
//!
//! Great-circle navigation on a spherical Earth (radius 6371 km): the direct
//! formula used by the circular motion model, initial bearings used to derive
//! route courses, and haversine distances used by tests and logging.

mod types;

pub use types::{CoordError, LatLon, EARTH_RADIUS_KM, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Computes the point reached by travelling `distance_km` from `origin` along
/// the initial bearing `bearing_rad` (radians clockwise from north).
///
/// The resulting longitude is normalized to [-180, 180].
pub fn destination_point(origin: LatLon, bearing_rad: f64, distance_km: f64) -> LatLon {
    let angular = distance_km / EARTH_RADIUS_KM;
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing_rad.cos()).asin();
    let lon2 = lon1
        + (bearing_rad.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    LatLon {
        lat: lat2.to_degrees(),
        lon: normalize_longitude(lon2.to_degrees()),
    }
}

/// Initial great-circle bearing from `from` to `to`.
///
/// Returns bearing in degrees (0-360), where 0 = North, 90 = East.
pub fn initial_bearing(from: LatLon, to: LatLon) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Haversine distance between two points in kilometers.
pub fn distance_km(a: LatLon, b: LatLon) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Wraps a longitude in degrees into [-180, 180].
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the caller's sign for the antimeridian
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Wraps a bearing in degrees into [0, 360).
pub fn normalize_bearing(bearing: f64) -> f64 {
    let b = bearing.rem_euclid(360.0);
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Wraps an angle in radians into [0, 2π).
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(2.0 * PI);
    if a >= 2.0 * PI {
        0.0
    } else {
        a
    }
}
