//! Source name → factory mapping.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::error::{GeneratorError, RouteError};
use super::params::{SourceParams, SourceSpec};
use super::route::{Route, RouteSource};
use super::{csv, dynamic, geojson, replay};
use super::{CircularMotion, FixSource, PlaybackOptions, PositionSource, ReplaySource};

/// Builds a position source from its parameters.
pub type SourceFactory =
    Box<dyn Fn(&SourceParams, &PlaybackOptions) -> Result<PositionSource, GeneratorError> + Send + Sync>;

const ROUTE_KEYWORDS: &[&str] = &["index"];

/// Explicit registry of available position sources.
pub struct GeneratorRegistry {
    factories: BTreeMap<String, SourceFactory>,
}

impl GeneratorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding `dynamic`, `geojson`, `csv` and `nmea`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert(
            dynamic::NAME,
            Box::new(|params: &SourceParams, _: &PlaybackOptions| {
                CircularMotion::from_params(params).map(PositionSource::Dynamic)
            }),
        );
        registry.insert(
            geojson::NAME,
            Box::new(|params: &SourceParams, options: &PlaybackOptions| {
                route_from_params(geojson::NAME, params, options, geojson::load_geojson)
            }),
        );
        registry.insert(
            csv::NAME,
            Box::new(|params: &SourceParams, options: &PlaybackOptions| {
                route_from_params(csv::NAME, params, options, csv::load_csv)
            }),
        );
        registry.insert(
            replay::NAME,
            Box::new(|params: &SourceParams, options: &PlaybackOptions| {
                ReplaySource::from_params(params, options.route_end).map(PositionSource::Replay)
            }),
        );
        registry
    }

    /// Registers an additional source under `name`, replacing any existing
    /// entry with the same name.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&SourceParams, &PlaybackOptions) -> Result<Box<dyn FixSource>, GeneratorError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(
            name,
            Box::new(move |params: &SourceParams, options: &PlaybackOptions| {
                factory(params, options).map(PositionSource::External)
            }),
        );
    }

    fn insert(&mut self, name: &str, factory: SourceFactory) {
        let name = normalize_name(name);
        if self.factories.insert(name.clone(), factory).is_some() {
            debug!(source = %name, "Replaced registered source");
        }
    }

    /// Builds the source described by `spec`.
    pub fn create(
        &self,
        spec: &SourceSpec,
        options: &PlaybackOptions,
    ) -> Result<PositionSource, GeneratorError> {
        let factory = self
            .factories
            .get(&normalize_name(&spec.name))
            .ok_or_else(|| GeneratorError::UnknownSource {
                name: spec.name.clone(),
                known: self.names().iter().map(|n| n.to_string()).collect(),
            })?;
        factory(&spec.params, options)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Whether `name` is registered, compared case-insensitively.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_name(name))
    }
}

/// Registry keys are trimmed and lowercased.
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Shared factory for file-backed routes: `<file> [index=]`.
fn route_from_params(
    name: &'static str,
    params: &SourceParams,
    options: &PlaybackOptions,
    load: fn(&Path) -> Result<Route, RouteError>,
) -> Result<PositionSource, GeneratorError> {
    params.ensure_known(name, ROUTE_KEYWORDS, 1)?;
    let path = params.required(name, 0, "file")?;
    let start = params.keyword_parse(name, "index", 0usize)?;

    let route = load(Path::new(path))?;
    let points = route.len();
    RouteSource::starting_at(name, route, start, options.route_end)
        .map(PositionSource::Route)
        .ok_or_else(|| {
            GeneratorError::invalid(name, "index", start, format!("route has only {} points", points))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::Fix;
    use chrono::Utc;
    use std::io::Write;

    struct Fixed(u32);

    impl FixSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn next_fix(&mut self) -> Option<Fix> {
            if self.0 == 0 {
                return None;
            }
            self.0 -= 1;
            Some(Fix::new(1.0, 2.0, Utc::now()))
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = GeneratorRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["csv", "dynamic", "geojson", "nmea"]);
    }

    #[test]
    fn test_contains_matches_registered_spelling() {
        let mut registry = GeneratorRegistry::with_builtins();
        assert!(registry.contains("dynamic"));
        assert!(registry.contains("Dynamic"));
        assert!(registry.contains(" CSV "));
        assert!(!registry.contains("gpx"));

        registry.register(" Fixed ", |_, _| Ok(Box::new(Fixed(1)) as Box<dyn FixSource>));
        assert!(registry.contains("fixed"));
        assert!(registry.contains("FIXED"));
    }

    #[test]
    fn test_unknown_source_lists_names() {
        let registry = GeneratorRegistry::with_builtins();
        let spec = SourceSpec::parse("gpx", ["track.gpx"]).unwrap();
        match registry.create(&spec, &PlaybackOptions::default()).unwrap_err() {
            GeneratorError::UnknownSource { name, known } => {
                assert_eq!(name, "gpx");
                assert_eq!(known, vec!["csv", "dynamic", "geojson", "nmea"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_dynamic() {
        let registry = GeneratorRegistry::with_builtins();
        let spec = SourceSpec::parse("dynamic", ["55.0", "37.0"]).unwrap();
        let source = registry.create(&spec, &PlaybackOptions::default()).unwrap();
        assert!(matches!(source, PositionSource::Dynamic(_)));
        assert_eq!(source.name(), "dynamic");
    }

    #[test]
    fn test_create_csv_with_index() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1,55.0,37.0,10,100").unwrap();
        writeln!(file, "2,55.1,37.1,10,100").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let registry = GeneratorRegistry::with_builtins();
        let spec = SourceSpec::parse("csv", [path.as_str(), "index=1"]).unwrap();
        let mut source = registry.create(&spec, &PlaybackOptions::default()).unwrap();
        assert_eq!(source.next_fix().unwrap().latitude, 55.1);
        assert!(source.next_fix().is_none());

        let spec = SourceSpec::parse("csv", [path.as_str(), "index=5"]).unwrap();
        assert!(registry.create(&spec, &PlaybackOptions::default()).is_err());
    }

    #[test]
    fn test_missing_file_parameter() {
        let registry = GeneratorRegistry::with_builtins();
        let spec = SourceSpec::parse("geojson", Vec::<String>::new()).unwrap();
        assert!(matches!(
            registry.create(&spec, &PlaybackOptions::default()),
            Err(GeneratorError::MissingParameter { parameter: "file", .. })
        ));
    }

    #[test]
    fn test_register_external_source() {
        let mut registry = GeneratorRegistry::with_builtins();
        registry.register("fixed", |params, _| {
            let count = params.keyword_parse("fixed", "count", 1u32)?;
            Ok(Box::new(Fixed(count)) as Box<dyn FixSource>)
        });
        assert!(registry.contains("fixed"));

        let spec = SourceSpec::parse("fixed", ["count=2"]).unwrap();
        let mut source = registry.create(&spec, &PlaybackOptions::default()).unwrap();
        assert!(matches!(source, PositionSource::External(_)));
        assert!(source.next_fix().is_some());
        assert!(source.next_fix().is_some());
        assert!(source.next_fix().is_none());
    }
}
