//! The tick loop.
//!
//! One tick: ask the position source for a fix, encode it, broadcast the
//! sentence pair, render the fix, then hold according to its transition mode.
//!
//! ```text
//! PositionSource ──► encode ──► BroadcastServer ──► FixRenderer ──► TransitionController
//!       ▲                                                                   │
//!       └─────────────────────────── next tick ◄────────────────────────────┘
//! ```
//!
//! Ticks are strictly sequential: a broadcast completes before the next fix
//! is produced.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::fix::Fix;
use crate::generator::{FixSource, PositionSource};
use crate::nmea::encode;
use crate::server::BroadcastServer;
use crate::transition::{TransitionController, TransitionOutcome};

// =============================================================================
// Rendering
// =============================================================================

/// Presentation collaborator notified of every emitted fix.
pub trait FixRenderer: Send {
    /// Called once per tick after the broadcast.
    fn render(&mut self, fix: &Fix, clients: usize);

    /// Called when playback pauses for a resume signal. `fix` is `None` for
    /// the start gate.
    fn waiting_for_resume(&mut self, fix: Option<&Fix>);

    /// Called once when playback ends.
    fn finished(&mut self, _summary: &RunSummary) {}
}

/// Renderer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl FixRenderer for NullRenderer {
    fn render(&mut self, _fix: &Fix, _clients: usize) {}

    fn waiting_for_resume(&mut self, _fix: Option<&Fix>) {}
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Why playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source has no more fixes.
    SourceExhausted,
    /// Shutdown was requested.
    Cancelled,
}

/// Summary returned when playback ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of fixes emitted.
    pub ticks: u64,
    pub reason: StopReason,
}

/// Drives the tick loop for one position source.
pub struct Orchestrator {
    source: PositionSource,
    controller: TransitionController,
    renderer: Box<dyn FixRenderer>,
    start_gate: bool,
}

impl Orchestrator {
    pub fn new(source: PositionSource, controller: TransitionController) -> Self {
        Self {
            source,
            controller,
            renderer: Box::new(NullRenderer),
            start_gate: false,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn FixRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// When enabled, nothing is emitted until the first resume signal.
    pub fn with_start_gate(mut self, enabled: bool) -> Self {
        self.start_gate = enabled;
        self
    }

    /// Runs until the source is exhausted or `shutdown` is cancelled.
    pub async fn run(mut self, server: &BroadcastServer, shutdown: &CancellationToken) -> RunSummary {
        info!(source = self.source.name(), addr = %server.local_addr(), "Playback starting");

        let summary = self.tick_loop(server, shutdown).await;

        info!(
            ticks = summary.ticks,
            reason = ?summary.reason,
            "Playback finished"
        );
        self.renderer.finished(&summary);
        summary
    }

    async fn tick_loop(&mut self, server: &BroadcastServer, shutdown: &CancellationToken) -> RunSummary {
        let mut ticks = 0;
        let stopped = |ticks, reason| RunSummary { ticks, reason };

        if self.start_gate {
            info!("Waiting for resume signal before first fix");
            self.renderer.waiting_for_resume(None);
            if self.controller.wait_for_resume(shutdown).await == TransitionOutcome::Cancelled {
                return stopped(ticks, StopReason::Cancelled);
            }
        }

        loop {
            if shutdown.is_cancelled() {
                return stopped(ticks, StopReason::Cancelled);
            }

            let tick_start = Instant::now();
            let Some(fix) = self.source.next_fix() else {
                return stopped(ticks, StopReason::SourceExhausted);
            };

            let pair = encode(&fix);
            let report = server.broadcast(&pair).await;
            ticks += 1;

            debug!(
                index = fix.index,
                lat = fix.latitude,
                lon = fix.longitude,
                delivered = report.delivered,
                "Emitted fix"
            );

            self.renderer.render(&fix, server.client_count());
            if fix.transition.waits_for_resume() {
                self.renderer.waiting_for_resume(Some(&fix));
            }

            if self.controller.hold(&fix, tick_start, shutdown).await == TransitionOutcome::Cancelled {
                return stopped(ticks, StopReason::Cancelled);
            }

            // Zero-duration points would otherwise never yield
            tokio::task::yield_now().await;
        }
    }
}
