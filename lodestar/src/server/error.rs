//! Broadcast server errors.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while setting up the broadcast server.
///
/// Per-client failures are never surfaced here; they only drop the client.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("Failed to bind TCP listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The bound socket did not report its address.
    #[error("Failed to read listener address: {0}")]
    LocalAddr(#[source] io::Error),

    /// `start` was called more than once.
    #[error("Server accept loop already started")]
    AlreadyStarted,
}
