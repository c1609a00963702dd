//! Per-point pacing.
//!
//! After each fix is broadcast the orchestrator hands it to the
//! [`TransitionController`], which decides when the next tick may start:
//!
//! ```text
//!                 transition = auto
//!   ┌────────┐  hold until tick_start + duration   ┌─────────┐
//!   │  AUTO  │ ──────────────────────────────────► │ advance │
//!   └────────┘                                     └─────────┘
//!       │ transition = manual | key                     ▲
//!       ▼                                               │
//!   ┌─────────────┐  resume signal                      │
//!   │ WAIT_RESUME │ ────────────────────────────────────┘
//!   └─────────────┘
//! ```
//!
//! Every wait is raced against the shutdown token. Resume events that arrive
//! while the controller is not waiting are discarded when the next wait
//! begins, so a key pressed during an automatic segment does not skip a
//! manual point.
//!
//! # Example
//!
//! ```ignore
//! use lodestar::transition::{resume_channel, TransitionController};
//!
//! let (signal, listener) = resume_channel();
//! let mut controller = TransitionController::new(listener);
//!
//! // From the keypress source
//! signal.resume();
//!
//! // In the tick loop
//! match controller.hold(&fix, tick_start, &shutdown).await {
//!     TransitionOutcome::Advance => continue,
//!     TransitionOutcome::Cancelled => break,
//! }
//! ```

use std::future;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fix::Fix;

// =============================================================================
// Resume channel
// =============================================================================

/// Creates a connected resume signal/listener pair.
pub fn resume_channel() -> (ResumeSignal, ResumeListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ResumeSignal { tx },
        ResumeListener { rx, closed: false },
    )
}

/// Sending half: raised by the operator (keypress, API call, test).
#[derive(Debug, Clone)]
pub struct ResumeSignal {
    tx: mpsc::UnboundedSender<()>,
}

impl ResumeSignal {
    /// Requests that a paused stream continue.
    ///
    /// Returns false once the listener has been dropped.
    pub fn resume(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Receiving half, owned by the controller.
#[derive(Debug)]
pub struct ResumeListener {
    rx: mpsc::UnboundedReceiver<()>,
    closed: bool,
}

impl ResumeListener {
    /// Discards events queued before the current wait; returns how many.
    fn drain(&mut self) -> usize {
        let mut stale = 0;
        while self.rx.try_recv().is_ok() {
            stale += 1;
        }
        stale
    }

    /// Waits for the next event; returns false (once) when every signal has
    /// been dropped, and never completes after that.
    async fn next(&mut self) -> bool {
        if self.closed {
            return future::pending().await;
        }
        match self.rx.recv().await {
            Some(()) => true,
            None => {
                self.closed = true;
                false
            }
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Auto,
    WaitResume,
}

/// Result of holding a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Proceed to the next tick.
    Advance,
    /// Shutdown was requested while holding.
    Cancelled,
}

/// Per-point pacing state machine.
#[derive(Debug)]
pub struct TransitionController {
    listener: Option<ResumeListener>,
    state: TransitionState,
}

impl TransitionController {
    pub fn new(listener: ResumeListener) -> Self {
        Self {
            listener: Some(listener),
            state: TransitionState::Auto,
        }
    }

    /// A controller with no resume source: waits end only on shutdown.
    pub fn without_resume() -> Self {
        Self {
            listener: None,
            state: TransitionState::Auto,
        }
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Holds the point that was emitted at `tick_start` according to its
    /// transition mode.
    ///
    /// For `auto` the hold ends at `tick_start + duration`, so time already
    /// spent encoding and broadcasting counts against the duration.
    pub async fn hold(
        &mut self,
        fix: &Fix,
        tick_start: Instant,
        shutdown: &CancellationToken,
    ) -> TransitionOutcome {
        if fix.transition.waits_for_resume() {
            return self.wait_for_resume(shutdown).await;
        }

        self.state = TransitionState::Auto;
        let Some(deadline) = tick_start.checked_add(fix.duration) else {
            warn!(duration = ?fix.duration, "Hold duration out of range; waiting for shutdown");
            shutdown.cancelled().await;
            return TransitionOutcome::Cancelled;
        };
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => TransitionOutcome::Cancelled,
            _ = sleep_until(deadline) => TransitionOutcome::Advance,
        }
    }

    /// Suspends until a resume event arrives after this call begins.
    pub async fn wait_for_resume(&mut self, shutdown: &CancellationToken) -> TransitionOutcome {
        self.state = TransitionState::WaitResume;

        if let Some(listener) = self.listener.as_mut() {
            let stale = listener.drain();
            if stale > 0 {
                debug!(stale, "Discarded resume events received before wait");
            }
        }

        let outcome = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break TransitionOutcome::Cancelled,
                resumed = Self::next_event(&mut self.listener) => {
                    if resumed {
                        break TransitionOutcome::Advance;
                    }
                    warn!("Resume source closed; waiting for shutdown");
                }
            }
        };

        self.state = TransitionState::Auto;
        outcome
    }

    async fn next_event(listener: &mut Option<ResumeListener>) -> bool {
        match listener {
            Some(listener) => listener.next().await,
            None => future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::TransitionMode;
    use chrono::Utc;
    use std::time::Duration;

    fn point(mode: TransitionMode, secs: u64) -> Fix {
        Fix::new(0.0, 0.0, Utc::now()).with_transition(mode, Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_holds_for_duration() {
        let mut controller = TransitionController::without_resume();
        let shutdown = CancellationToken::new();
        let start = Instant::now();

        let outcome = controller
            .hold(&point(TransitionMode::Auto, 2), start, &shutdown)
            .await;

        assert_eq!(outcome, TransitionOutcome::Advance);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_deducts_time_already_spent() {
        let mut controller = TransitionController::without_resume();
        let shutdown = CancellationToken::new();
        let start = Instant::now();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        controller
            .hold(&point(TransitionMode::Auto, 2), start, &shutdown)
            .await;

        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_waits_for_resume() {
        let (signal, listener) = resume_channel();
        let mut controller = TransitionController::new(listener);
        let shutdown = CancellationToken::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            signal.resume();
        });

        let start = Instant::now();
        let outcome = controller
            .hold(&point(TransitionMode::Manual, 0), start, &shutdown)
            .await;

        assert_eq!(outcome, TransitionOutcome::Advance);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(controller.state(), TransitionState::Auto);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_resume_is_discarded() {
        let (signal, listener) = resume_channel();
        let mut controller = TransitionController::new(listener);
        let shutdown = CancellationToken::new();

        signal.resume();
        signal.resume();

        let waited = tokio::time::timeout(
            Duration::from_secs(5),
            controller.hold(&point(TransitionMode::Key, 0), Instant::now(), &shutdown),
        )
        .await;
        assert!(waited.is_err(), "stale resume advanced the stream");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let (_signal, listener) = resume_channel();
        let mut controller = TransitionController::new(listener);
        let shutdown = CancellationToken::new();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let outcome = controller
            .hold(&point(TransitionMode::Manual, 0), Instant::now(), &shutdown)
            .await;
        assert_eq!(outcome, TransitionOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_auto_hold() {
        let mut controller = TransitionController::without_resume();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let start = Instant::now();
        let outcome = controller
            .hold(&point(TransitionMode::Auto, 60), start, &shutdown)
            .await;
        assert_eq!(outcome, TransitionOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_deadline_waits_for_shutdown() {
        let mut controller = TransitionController::without_resume();
        let shutdown = CancellationToken::new();
        let fix = Fix::new(0.0, 0.0, Utc::now()).with_transition(TransitionMode::Auto, Duration::MAX);

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let outcome = controller.hold(&fix, start, &shutdown).await;
        assert_eq!(outcome, TransitionOutcome::Cancelled);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_source_waits_for_shutdown() {
        let (signal, listener) = resume_channel();
        drop(signal);
        let mut controller = TransitionController::new(listener);
        let shutdown = CancellationToken::new();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let outcome = controller.wait_for_resume(&shutdown).await;
        assert_eq!(outcome, TransitionOutcome::Cancelled);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_signal_reports_dropped_listener() {
        let (signal, listener) = resume_channel();
        assert!(signal.resume());
        drop(listener);
        assert!(!signal.resume());
    }
}
