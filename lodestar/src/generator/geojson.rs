//! GeoJSON route loading.
//!
//! Accepts a `FeatureCollection` of `Point` features:
//!
//! ```json
//! {
//!   "type": "FeatureCollection",
//!   "features": [{
//!     "type": "Feature",
//!     "geometry": { "type": "Point", "coordinates": [37.6156, 55.7522] },
//!     "properties": { "speed": 10.0, "elevation": 120.5, "duration": 2.0,
//!                     "transition": "auto", "description": "Moscow center" }
//!   }]
//! }
//! ```
//!
//! `speed`, `elevation` and `duration` are required; `transition` and
//! `description` are optional. Non-point features are skipped.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::error::RouteError;
use super::route::Route;
use crate::coord::LatLon;
use crate::fix::{duration_from_secs, Fix, TransitionMode, MAX_DURATION_SECS};

/// Registry name.
pub const NAME: &str = "geojson";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Reads and parses a GeoJSON route file.
pub fn load_geojson(path: &Path) -> Result<Route, RouteError> {
    let text = fs::read_to_string(path).map_err(|e| RouteError::io(path, e))?;
    parse_geojson(&text)
}

/// Parses GeoJSON text into a route.
pub fn parse_geojson(text: &str) -> Result<Route, RouteError> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    if collection.kind != "FeatureCollection" {
        return Err(RouteError::Feature {
            index: 0,
            reason: format!("expected a FeatureCollection, found '{}'", collection.kind),
        });
    }

    let mut points = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.iter().enumerate() {
        let index = i + 1;
        let Some(geometry) = feature.geometry.as_ref().filter(|g| g.kind == "Point") else {
            debug!(feature = index, "Skipping non-point feature");
            continue;
        };
        let fail = |reason: String| RouteError::Feature { index, reason };

        let position = point_coordinates(&geometry.coordinates).map_err(fail)?;
        let empty = Map::new();
        let props = feature.properties.as_ref().unwrap_or(&empty);

        let speed = number_property(props, "speed").map_err(fail)?;
        if speed < 0.0 {
            return Err(fail(format!("speed {} must not be negative", speed)));
        }
        let elevation = number_property(props, "elevation").map_err(fail)?;
        let secs = number_property(props, "duration").map_err(fail)?;
        let duration = duration_from_secs(secs)
            .ok_or_else(|| fail(format!("duration {} must be between 0 and {} seconds", secs, MAX_DURATION_SECS)))?;

        let transition = match props.get("transition") {
            None | Some(Value::Null) => TransitionMode::Auto,
            Some(Value::String(s)) => s.parse().map_err(|e| fail(format!("{}", e)))?,
            Some(other) => return Err(fail(format!("transition must be a string, found {}", other))),
        };
        let description = match props.get("description") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };

        points.push(
            Fix::new(position.lat, position.lon, Utc::now())
                .with_speed(speed)
                .with_elevation(elevation)
                .with_transition(transition, duration)
                .with_description(description),
        );
    }

    Route::from_waypoints(points)
}

/// Extracts `[lon, lat]` (extra members such as altitude are ignored).
fn point_coordinates(value: &Value) -> Result<LatLon, String> {
    let coords = value
        .as_array()
        .filter(|c| c.len() >= 2)
        .ok_or_else(|| "point coordinates must be [lon, lat]".to_string())?;
    let lon = coords[0]
        .as_f64()
        .ok_or_else(|| format!("longitude {} is not a number", coords[0]))?;
    let lat = coords[1]
        .as_f64()
        .ok_or_else(|| format!("latitude {} is not a number", coords[1]))?;
    LatLon::new(lat, lon).map_err(|e| e.to_string())
}

/// Required numeric property; numeric strings are accepted.
fn number_property(props: &Map<String, Value>, key: &str) -> Result<f64, String> {
    let value = props
        .get(key)
        .ok_or_else(|| format!("missing required property '{}'", key))?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("property '{}' is not a number: {}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const ROUTE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [37.6156, 55.7522]},
             "properties": {"speed": 10.0, "elevation": 120.5, "duration": 2.0,
                            "description": "Moscow center"}},
            {"type": "Feature",
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
             "properties": {}},
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [30.3351, 59.9343, 5.0]},
             "properties": {"speed": "12.5", "elevation": 5.5, "duration": 0,
                            "transition": "manual"}}
        ]
    }"#;

    #[test]
    fn test_parse_points_skips_other_geometry() {
        let route = parse_geojson(ROUTE).unwrap();
        assert_eq!(route.len(), 2);

        let first = &route.points()[0];
        assert_eq!(first.latitude, 55.7522);
        assert_eq!(first.longitude, 37.6156);
        assert_eq!(first.duration, Duration::from_secs(2));
        assert_eq!(first.description.as_deref(), Some("Moscow center"));
        assert_eq!(first.transition, TransitionMode::Auto);

        let second = &route.points()[1];
        assert_eq!(second.speed_kmh, 12.5);
        assert_eq!(second.transition, TransitionMode::Manual);
    }

    #[test]
    fn test_missing_required_property() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]},
             "properties": {"speed": 1, "elevation": 0}}]}"#;
        match parse_geojson(text).unwrap_err() {
            RouteError::Feature { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("duration"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_coordinate_rejected() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [200, 10]},
             "properties": {"speed": 1, "elevation": 0, "duration": 1}}]}"#;
        assert!(matches!(parse_geojson(text), Err(RouteError::Feature { .. })));
    }

    #[test]
    fn test_oversized_duration_rejected() {
        for duration in ["1e30", "1e19", "\"86401\""] {
            let text = format!(
                r#"{{"type": "FeatureCollection", "features": [
                    {{"type": "Feature", "geometry": {{"type": "Point", "coordinates": [37, 55]}},
                     "properties": {{"speed": 1, "elevation": 1, "duration": {}}}}}]}}"#,
                duration
            );
            match parse_geojson(&text) {
                Err(RouteError::Feature { index: 1, reason }) => assert!(reason.contains("duration")),
                other => panic!("accepted duration {}: {:?}", duration, other),
            }
        }
    }

    #[test]
    fn test_unknown_transition_rejected() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]},
             "properties": {"speed": 1, "elevation": 0, "duration": 1, "transition": "maybe"}}]}"#;
        assert!(parse_geojson(text).is_err());
    }

    #[test]
    fn test_no_points_is_empty_route() {
        let text = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(parse_geojson(text), Err(RouteError::Empty)));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse_geojson("{not json"), Err(RouteError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ROUTE.as_bytes()).unwrap();
        let route = load_geojson(file.path()).unwrap();
        assert_eq!(route.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_geojson(Path::new("/nonexistent/route.geojson")).unwrap_err();
        assert!(matches!(err, RouteError::Io { .. }));
    }
}
