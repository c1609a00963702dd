//! Integration tests for end-to-end playback.
//!
//! These tests run the full app (registry → source → orchestrator →
//! server) against a real loopback client:
//! - Circular motion streams until shutdown
//! - Manual route points wait for a resume signal
//! - NMEA replay re-broadcasts a recorded log
//!
//! Run with: `cargo test --test playback_integration`

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use lodestar::app::{AppConfig, LodestarApp};
use lodestar::coord::{distance_km, LatLon};
use lodestar::generator::{GeneratorRegistry, SourceSpec};
use lodestar::nmea::{parse_sentence, Sentence};
use lodestar::orchestrator::{NullRenderer, StopReason};
use lodestar::server::ServerConfig;
use lodestar::transition::resume_channel;

// ============================================================================
// Helper Functions
// ============================================================================

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for the accept loop to register a fresh connection.
const REGISTER_DELAY: Duration = Duration::from_millis(100);

async fn start(source: &str, params: &[&str], gated: bool) -> (LodestarApp, CancellationToken) {
    let spec = SourceSpec::parse(source, params.iter().copied()).unwrap();
    let config = AppConfig::new(spec)
        .with_server(ServerConfig::loopback())
        .with_wait_for_keypress(gated);
    let shutdown = CancellationToken::new();
    let app = LodestarApp::start(config, &GeneratorRegistry::with_builtins(), &shutdown)
        .await
        .unwrap();
    (app, shutdown)
}

async fn next_sentence<R>(lines: &mut tokio::io::Lines<R>) -> Option<Sentence>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let line = timeout(READ_TIMEOUT, lines.next_line())
        .await
        .expect("read timed out")
        .expect("read failed")?;
    Some(parse_sentence(&line).unwrap())
}

fn rmc_position(sentence: Sentence) -> LatLon {
    match sentence {
        Sentence::Rmc(rmc) => rmc.position,
        other => panic!("expected RMC, got {:?}", other),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_dynamic_source_streams_until_shutdown() {
    let (app, shutdown) = start(
        "dynamic",
        &["55.75", "37.61", "speed=36", "duration=0.02", "radius=0.5"],
        true,
    )
    .await;
    let addr = app.local_addr();
    let (signal, listener) = resume_channel();

    let run_shutdown = shutdown.clone();
    let runner = tokio::spawn(async move {
        app.run(Some(listener), Box::new(NullRenderer), &run_shutdown).await
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(REGISTER_DELAY).await;
    assert!(signal.resume());

    let mut lines = BufReader::new(stream).lines();
    let mut positions = Vec::new();
    for _ in 0..3 {
        positions.push(rmc_position(next_sentence(&mut lines).await.unwrap()));
        assert!(matches!(next_sentence(&mut lines).await, Some(Sentence::Gga(_))));
    }

    // The first tick is the start point; later ones stay on the circle
    assert!((positions[0].lat - 55.75).abs() < 1e-4);
    assert!((positions[0].lon - 37.61).abs() < 1e-4);
    let start = LatLon::new(55.75, 37.61).unwrap();
    for position in &positions[1..] {
        assert!(distance_km(start, *position) < 1.01);
    }

    shutdown.cancel();
    let summary = timeout(READ_TIMEOUT, runner).await.unwrap().unwrap();
    assert_eq!(summary.reason, StopReason::Cancelled);
    assert!(summary.ticks >= 3);

    // Remaining buffered sentences, then EOF
    while next_sentence(&mut lines).await.is_some() {}
}

#[tokio::test]
async fn test_manual_route_waits_for_resume() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "point_number,latitude,longitude,speed,elevation,duration,transition").unwrap();
    writeln!(file, "1,10.0,20.0,5,10,0,manual").unwrap();
    writeln!(file, "2,10.1,20.1,5,10,0,auto").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let (app, shutdown) = start("csv", &[path.as_str()], true).await;
    let addr = app.local_addr();
    let (signal, listener) = resume_channel();

    let run_shutdown = shutdown.clone();
    let runner = tokio::spawn(async move {
        app.run(Some(listener), Box::new(NullRenderer), &run_shutdown).await
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(REGISTER_DELAY).await;
    assert!(signal.resume());

    let mut lines = BufReader::new(stream).lines();
    let first = rmc_position(next_sentence(&mut lines).await.unwrap());
    assert!((first.lat - 10.0).abs() < 1e-4);
    next_sentence(&mut lines).await.unwrap();

    // Held on the manual point: nothing arrives until resumed
    let held = timeout(Duration::from_millis(200), lines.next_line()).await;
    assert!(held.is_err(), "manual point advanced without a resume signal");

    assert!(signal.resume());
    let second = rmc_position(next_sentence(&mut lines).await.unwrap());
    assert!((second.lat - 10.1).abs() < 1e-4);
    next_sentence(&mut lines).await.unwrap();

    let summary = timeout(READ_TIMEOUT, runner).await.unwrap().unwrap();
    assert_eq!(summary.ticks, 2);
    assert_eq!(summary.reason, StopReason::SourceExhausted);
    assert!(!shutdown.is_cancelled());

    // Route exhausted: the server closes the connection
    assert!(next_sentence(&mut lines).await.is_none());
}

#[tokio::test]
async fn test_replay_rebroadcasts_log() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A").unwrap();
    writeln!(file, "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47").unwrap();
    writeln!(file, "garbage line").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let (app, shutdown) = start("nmea", &[path.as_str(), "duration=0.01"], true).await;
    let addr = app.local_addr();
    let (signal, listener) = resume_channel();

    let run_shutdown = shutdown.clone();
    let runner = tokio::spawn(async move {
        app.run(Some(listener), Box::new(NullRenderer), &run_shutdown).await
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(REGISTER_DELAY).await;
    signal.resume();

    let mut lines = BufReader::new(stream).lines();
    match next_sentence(&mut lines).await.unwrap() {
        Sentence::Rmc(rmc) => {
            assert!((rmc.position.lat - 48.1173).abs() < 1e-4);
            assert!((rmc.position.lon - 11.5167).abs() < 1e-4);
            assert!(rmc.time_field.starts_with("123519"));
        }
        other => panic!("expected RMC, got {:?}", other),
    }
    match next_sentence(&mut lines).await.unwrap() {
        Sentence::Gga(gga) => assert_eq!(gga.altitude, Some(545.4)),
        other => panic!("expected GGA, got {:?}", other),
    }

    let summary = timeout(READ_TIMEOUT, runner).await.unwrap().unwrap();
    assert_eq!(summary.ticks, 1);
    assert!(!shutdown.is_cancelled());
}
