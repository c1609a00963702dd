//! Lodestar CLI - simulated GNSS receiver.
//!
//! Streams NMEA 0183 `RMC` + `GGA` sentences to TCP clients from a chosen
//! position source:
//!
//! ```text
//! lodestar [PORT] --source dynamic <lat> <lon> [speed=] [duration=] [radius=]
//! lodestar [PORT] --source geojson <file> [index=]
//! lodestar [PORT] --source csv <file> [index=]
//! lodestar [PORT] --source nmea <file> [duration=] [index=]
//! ```

mod display;
mod error;
mod keypress;
mod runner;

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lodestar::app::{AppConfig, LodestarApp};
use lodestar::config::ConfigFile;
use lodestar::generator::{GeneratorRegistry, RouteEnd, SourceSpec};
use lodestar::orchestrator::{FixRenderer, NullRenderer};
use lodestar::transition::resume_channel;

use display::ConsoleRenderer;
use error::CliError;
use runner::CliRunner;

/// End-of-route policy for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
enum RouteEndArg {
    /// End the stream after the last point
    Stop,
    /// Start over from the first point
    Loop,
    /// Keep re-emitting the last point
    Hold,
}

impl From<RouteEndArg> for RouteEnd {
    fn from(arg: RouteEndArg) -> Self {
        match arg {
            RouteEndArg::Stop => RouteEnd::Stop,
            RouteEndArg::Loop => RouteEnd::Loop,
            RouteEndArg::Hold => RouteEnd::Hold,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lodestar")]
#[command(version, about = "Simulated GNSS receiver streaming NMEA 0183 over TCP", long_about = None)]
struct Args {
    /// TCP port to listen on (overrides config.ini)
    port: Option<u16>,

    /// Position source followed by its parameters, e.g. `dynamic 55.75 37.61 speed=60`
    #[arg(
        long,
        short,
        required = true,
        num_args = 1..,
        allow_negative_numbers = true,
        value_name = "NAME [PARAMS]"
    )]
    source: Vec<String>,

    /// Hold the stream until Enter is pressed
    #[arg(long)]
    wait_for_keypress: bool,

    /// What finite routes do after the last point
    #[arg(long, value_enum)]
    route_end: Option<RouteEndArg>,

    /// Address to bind (overrides config.ini)
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Config file path (default: ~/.lodestar/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not draw the live point table
    #[arg(long)]
    no_display: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    /// Config file values overlaid with command-line flags.
    fn app_config(&self, file: &ConfigFile) -> Result<AppConfig, CliError> {
        let (name, params) = self
            .source
            .split_first()
            .ok_or_else(|| CliError::Config("--source requires a source name".to_string()))?;
        let spec = SourceSpec::parse(name.as_str(), params)?;

        let mut config = AppConfig::from_config_file(spec, file);
        if let Some(port) = self.port {
            config.server = config.server.with_port(port);
        }
        if let Some(bind) = self.bind {
            config.server = config.server.with_bind(bind);
        }
        if let Some(route_end) = self.route_end {
            config = config.with_route_end(route_end.into());
        }
        if self.wait_for_keypress {
            config = config.with_wait_for_keypress(true);
        }
        Ok(config)
    }
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        e.exit();
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug, args.no_display)?;
    runner.log_startup();
    let config = args.app_config(runner.config())?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(serve(config, runner.display_enabled(), shutdown))
}

async fn serve(config: AppConfig, display: bool, shutdown: CancellationToken) -> Result<(), CliError> {
    let registry = GeneratorRegistry::with_builtins();
    let source_name = config.source.name.clone();
    let gated = config.wait_for_keypress;
    let route_end = config.playback.route_end;

    let app = LodestarApp::start(config, &registry, &shutdown).await?;

    println!("Lodestar GNSS Simulator v{}", lodestar::VERSION);
    println!("================================");
    println!();
    println!("Source:    {}", style(&source_name).cyan());
    println!("Listening: {}", style(app.local_addr()).cyan());
    println!("Route end: {}", route_end);
    if gated {
        println!("Waiting:   stream starts on first Enter");
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let (signal, listener) = resume_channel();
    if let Err(e) = keypress::spawn_stdin_reader(signal) {
        warn!(error = %e, "Failed to start keypress reader; manual points wait for Ctrl+C");
    }

    let renderer: Box<dyn FixRenderer> = if display {
        Box::new(ConsoleRenderer::new())
    } else {
        Box::new(NullRenderer)
    };

    let summary = app.run(Some(listener), renderer, &shutdown).await;
    info!(ticks = summary.ticks, reason = ?summary.reason, "Lodestar stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_source_with_negative_coordinates() {
        let args = parse(&["lodestar", "10110", "--source", "dynamic", "-33.86", "151.2", "speed=40"]);
        assert_eq!(args.port, Some(10110));
        assert_eq!(args.source, vec!["dynamic", "-33.86", "151.2", "speed=40"]);

        let config = args.app_config(&ConfigFile::default()).unwrap();
        assert_eq!(config.source.name, "dynamic");
        assert_eq!(config.source.params.positional(), &["-33.86", "151.2"]);
        assert_eq!(config.source.params.keyword("speed"), Some("40"));
        assert_eq!(config.server.port, 10110);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = ConfigFile::default();
        file.server.port = 6000;
        file.playback.route_end = RouteEnd::Loop;

        let args = parse(&[
            "lodestar",
            "--route-end",
            "hold",
            "--bind",
            "127.0.0.1",
            "--wait-for-keypress",
            "--source",
            "csv",
            "route.csv",
        ]);
        let config = args.app_config(&file).unwrap();
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.server.bind.to_string(), "127.0.0.1");
        assert_eq!(config.playback.route_end, RouteEnd::Hold);
        assert!(config.wait_for_keypress);
    }

    #[test]
    fn test_config_file_used_without_flags() {
        let mut file = ConfigFile::default();
        file.playback.route_end = RouteEnd::Loop;
        file.playback.wait_for_keypress = true;

        let args = parse(&["lodestar", "--source", "geojson", "route.geojson"]);
        let config = args.app_config(&file).unwrap();
        assert_eq!(config.playback.route_end, RouteEnd::Loop);
        assert!(config.wait_for_keypress);
    }

    #[test]
    fn test_source_is_required() {
        assert!(Args::try_parse_from(["lodestar", "5000"]).is_err());
    }

    #[test]
    fn test_duplicate_keyword_rejected() {
        let args = parse(&["lodestar", "--source", "dynamic", "1", "2", "speed=1", "speed=2"]);
        assert!(args.app_config(&ConfigFile::default()).is_err());
    }
}
