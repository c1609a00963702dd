//! Application lifecycle.
//!
//! [`LodestarApp`] wires the generator registry, broadcast server and
//! orchestrator together and sequences startup and shutdown.

mod bootstrap;
mod config;
mod error;

pub use bootstrap::LodestarApp;
pub use config::AppConfig;
pub use error::AppError;
