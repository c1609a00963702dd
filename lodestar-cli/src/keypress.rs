//! Stdin-driven resume signal.
//!
//! A dedicated thread reads stdin line by line; every line (Enter) raises one
//! resume event. The thread ends when stdin closes or the listener is gone.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use tracing::debug;

use lodestar::transition::ResumeSignal;

/// Spawn the stdin reader thread.
pub fn spawn_stdin_reader(signal: ResumeSignal) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("lodestar-keypress".to_string())
        .spawn(move || {
            let forwarded = forward_lines(io::stdin().lock(), &signal);
            debug!(forwarded, "Stdin reader finished");
        })
}

/// Raises one resume event per line; returns how many were delivered.
fn forward_lines<R: BufRead>(reader: R, signal: &ResumeSignal) -> usize {
    let mut forwarded = 0;
    for line in reader.lines() {
        if let Err(e) = line {
            debug!(error = %e, "Stdin read failed");
            break;
        }
        if !signal.resume() {
            break;
        }
        forwarded += 1;
    }
    forwarded
}
