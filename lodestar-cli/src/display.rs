//! Live point table for the terminal.
//!
//! Redraws a small table in place on every tick:
//!
//! ```text
//!   #     Latitude    Longitude   Speed km/h  Elev m   Time (UTC)  Description
//!   42    55.752200   37.615600         36.0   120.5   12:00:41    Moscow, center
//!
//!   Clients: 2
//! ```
//!
//! When playback pauses, a prompt is appended below the table.

use console::{style, Term};

use lodestar::fix::Fix;
use lodestar::orchestrator::{FixRenderer, RunSummary, StopReason};

/// `FixRenderer` that draws into the terminal.
pub struct ConsoleRenderer {
    term: Term,
    drawn: usize,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            drawn: 0,
        }
    }

    fn redraw(&mut self, lines: &[String]) {
        let _ = self.term.clear_last_lines(self.drawn);
        self.drawn = 0;
        self.append(lines);
    }

    fn append(&mut self, lines: &[String]) {
        for line in lines {
            if self.term.write_line(line).is_ok() {
                self.drawn += 1;
            }
        }
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FixRenderer for ConsoleRenderer {
    fn render(&mut self, fix: &Fix, clients: usize) {
        let lines = [
            style(header()).bold().to_string(),
            format_row(fix),
            String::new(),
            format!("  Clients: {}", style(clients).cyan()),
        ];
        self.redraw(&lines);
    }

    fn waiting_for_resume(&mut self, fix: Option<&Fix>) {
        let prompt = match fix {
            Some(fix) => format!("Holding point {}. Press Enter to continue...", fix.index),
            None => "Press Enter to start streaming...".to_string(),
        };
        self.append(&[style(prompt).yellow().to_string()]);
    }

    fn finished(&mut self, summary: &RunSummary) {
        let reason = match summary.reason {
            StopReason::SourceExhausted => "route finished",
            StopReason::Cancelled => "stopped",
        };
        let _ = self
            .term
            .write_line(&format!("Playback {} after {} fixes", reason, summary.ticks));
    }
}

fn header() -> String {
    format!(
        "  {:<5} {:>11} {:>12} {:>11} {:>7}   {:<10}  {}",
        "#", "Latitude", "Longitude", "Speed km/h", "Elev m", "Time (UTC)", "Description"
    )
}

fn format_row(fix: &Fix) -> String {
    format!(
        "  {:<5} {:>11.6} {:>12.6} {:>11.1} {:>7.1}   {:<10}  {}",
        fix.index,
        fix.latitude,
        fix.longitude,
        fix.speed_kmh,
        fix.elevation,
        fix.timestamp.format("%H:%M:%S").to_string(),
        fix.description.as_deref().unwrap_or("")
    )
}
