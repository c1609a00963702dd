//! Lodestar - a GNSS receiver simulator.
//!
//! Produces a stream of geographic fixes (synthetic circular motion, a route
//! loaded from GeoJSON/CSV, or a replayed NMEA log) and broadcasts them as
//! NMEA 0183 `RMC` + `GGA` sentences to every connected TCP client.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   Fix   ┌─────────┐  SentencePair  ┌─────────────────┐
//! │ PositionSource   │────────►│ encoder │───────────────►│ BroadcastServer │──► clients
//! │ dynamic/geojson/ │         └─────────┘                └─────────────────┘
//! │ csv/nmea         │                                             │
//! └──────────────────┘                                             ▼
//!          ▲                 ┌──────────────────────┐      ┌─────────────┐
//!          └──── next tick ──│ TransitionController │◄─────│ FixRenderer │
//!                            └──────────────────────┘      └─────────────┘
//!                                      ▲ resume
//!                                      │
//!                                 ResumeSignal
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lodestar::app::{AppConfig, LodestarApp};
//! use lodestar::generator::{GeneratorRegistry, SourceSpec};
//! use lodestar::orchestrator::NullRenderer;
//!
//! let spec = SourceSpec::parse("dynamic", ["55.75", "37.61", "speed=60"])?;
//! let app = LodestarApp::start(AppConfig::new(spec), &GeneratorRegistry::with_builtins(), &shutdown).await?;
//! app.run(None, Box::new(NullRenderer), &shutdown).await;
//! ```

pub mod app;
pub mod config;
pub mod coord;
pub mod fix;
pub mod generator;
pub mod logging;
pub mod nmea;
pub mod orchestrator;
pub mod server;
pub mod transition;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
