//! Application bootstrap.
//!
//! `LodestarApp` owns the startup and shutdown ordering:
//!
//! 1. Build the position source (all configuration errors surface here,
//!    before any socket is opened)
//! 2. Bind the listener and start accepting clients
//! 3. Run the tick loop
//! 4. Stop accepting, then close every client connection
//!
//! # Example
//!
//! ```ignore
//! use lodestar::app::{AppConfig, LodestarApp};
//!
//! let registry = GeneratorRegistry::with_builtins();
//! let app = LodestarApp::start(config, &registry, &shutdown).await?;
//! println!("Listening on {}", app.local_addr());
//!
//! let summary = app.run(Some(listener), Box::new(NullRenderer), &shutdown).await;
//! ```

use std::net::SocketAddr;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::AppConfig;
use super::error::AppError;
use crate::generator::{FixSource, GeneratorRegistry, PositionSource};
use crate::orchestrator::{FixRenderer, Orchestrator, RunSummary};
use crate::server::BroadcastServer;
use crate::transition::{ResumeListener, TransitionController};

/// A started simulator: source built, server accepting clients.
pub struct LodestarApp {
    config: AppConfig,
    source: PositionSource,
    server: BroadcastServer,
    acceptor: JoinHandle<()>,
    server_shutdown: CancellationToken,
}

impl LodestarApp {
    /// Builds the source and starts the server.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Source`] for any source configuration problem (no
    /// socket is opened in that case) and [`AppError::Server`] if the
    /// listener cannot be bound.
    pub async fn start(
        config: AppConfig,
        registry: &GeneratorRegistry,
        shutdown: &CancellationToken,
    ) -> Result<Self, AppError> {
        let source = registry.create(&config.source, &config.playback)?;
        info!(
            source = source.name(),
            route_end = %config.playback.route_end,
            "Position source ready"
        );

        let mut server = BroadcastServer::bind(config.server.clone()).await?;
        let server_shutdown = shutdown.child_token();
        let acceptor = server.start(server_shutdown.clone())?;

        Ok(Self {
            config,
            source,
            server,
            acceptor,
            server_shutdown,
        })
    }

    /// Address clients connect to.
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs playback to completion, then stops the server.
    ///
    /// Without a resume listener, manual points and the start gate wait
    /// until shutdown.
    pub async fn run(
        self,
        resume: Option<ResumeListener>,
        renderer: Box<dyn FixRenderer>,
        shutdown: &CancellationToken,
    ) -> RunSummary {
        let Self {
            config,
            source,
            server,
            acceptor,
            server_shutdown,
        } = self;

        let controller = match resume {
            Some(listener) => TransitionController::new(listener),
            None => TransitionController::without_resume(),
        };

        let summary = Orchestrator::new(source, controller)
            .with_renderer(renderer)
            .with_start_gate(config.wait_for_keypress)
            .run(&server, shutdown)
            .await;

        server_shutdown.cancel();
        if let Err(e) = acceptor.await {
            debug!(error = %e, "Accept loop ended abnormally");
        }
        server.shutdown().await;

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppError;
    use crate::generator::SourceSpec;
    use crate::orchestrator::{NullRenderer, StopReason};
    use crate::server::ServerConfig;
    use std::io::Write;

    #[tokio::test]
    async fn test_unknown_source_fails_before_bind() {
        // Port 1 would need privileges; the source error must come first
        let config = AppConfig::new(SourceSpec::parse("gpx", ["x"]).unwrap())
            .with_server(ServerConfig::default().with_port(1));
        let result = LodestarApp::start(
            config,
            &GeneratorRegistry::with_builtins(),
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Source(_))));
    }

    #[tokio::test]
    async fn test_route_plays_to_end_and_stops_server() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1,55.0,37.0,10,100,0").unwrap();
        writeln!(file, "2,55.1,37.1,10,100,0").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = AppConfig::new(SourceSpec::parse("csv", [path]).unwrap())
            .with_server(ServerConfig::loopback());
        let shutdown = CancellationToken::new();
        let app = LodestarApp::start(config, &GeneratorRegistry::with_builtins(), &shutdown)
            .await
            .unwrap();
        let addr = app.local_addr();
        assert_ne!(addr.port(), 0);

        let summary = app.run(None, Box::new(NullRenderer), &shutdown).await;
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.reason, StopReason::SourceExhausted);
        assert!(!shutdown.is_cancelled());
    }
}
