//! Multi-client TCP broadcast of NMEA sentences.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐ insert  ┌────────────────┐
//!   TCP clients ─►│ accept loop  │────────►│ ClientRegistry │
//!                 └──────────────┘         └────────────────┘
//!                        │ spawn              ▲ remove   │ snapshot
//!                        ▼                    │          ▼
//!                 ┌──────────────┐            │   ┌─────────────┐
//!                 │ lifecycle    │────────────┘   │ broadcast() │──► every client
//!                 │ (read → EOF) │   on EOF       └─────────────┘    (concurrent,
//!                 └──────────────┘                                    timeout-bounded)
//! ```
//!
//! A slow or dead client never stalls the stream for longer than the write
//! timeout; it is removed and the remaining clients keep receiving data.
//!
//! # Example
//!
//! ```ignore
//! use lodestar::server::{BroadcastServer, ServerConfig};
//!
//! let mut server = BroadcastServer::bind(ServerConfig::default()).await?;
//! server.start(shutdown.clone())?;
//!
//! server.broadcast(&encode(&fix)).await;
//!
//! server.shutdown().await;
//! ```

mod config;
mod error;
mod registry;

pub use config::{ServerConfig, DEFAULT_BIND, DEFAULT_PORT, DEFAULT_WRITE_TIMEOUT};
pub use error::ServerError;
pub use registry::{ClientHandle, ClientId, ClientRegistry};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::nmea::SentencePair;

/// Pause after a failed accept before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Size of the buffer used to discard client input.
const DISCARD_BUFFER_SIZE: usize = 512;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients that received the full tick.
    pub delivered: usize,
    /// Clients removed because the write failed or timed out.
    pub dropped: usize,
}

/// TCP server that fans every tick out to all connected clients.
pub struct BroadcastServer {
    config: ServerConfig,
    local_addr: SocketAddr,
    listener: Option<TcpListener>,
    registry: Arc<ClientRegistry>,
}

impl BroadcastServer {
    /// Binds the listening socket. Clients are not accepted until
    /// [`start`](Self::start) is called.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        info!(addr = %local_addr, "NMEA server bound");

        Ok(Self {
            config,
            local_addr,
            listener: Some(listener),
            registry: Arc::new(ClientRegistry::new()),
        })
    }

    /// Spawns the accept loop. It stops (and drops the listener) when
    /// `shutdown` is cancelled.
    pub fn start(&mut self, shutdown: CancellationToken) -> Result<JoinHandle<()>, ServerError> {
        let listener = self.listener.take().ok_or(ServerError::AlreadyStarted)?;
        let registry = Arc::clone(&self.registry);
        Ok(tokio::spawn(accept_loop(listener, registry, shutdown)))
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of currently registered clients.
    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// Writes RMC then GGA to every registered client.
    ///
    /// Writes run concurrently, each bounded by the write timeout. Clients
    /// whose write fails or times out are removed. Never fails.
    pub async fn broadcast(&self, pair: &SentencePair) -> BroadcastReport {
        let clients = self.registry.snapshot();
        if clients.is_empty() {
            return BroadcastReport::default();
        }

        let bytes = pair.to_wire();
        let write_timeout = self.config.write_timeout;
        let writes = clients.iter().map(|client| {
            let bytes = bytes.as_slice();
            async move {
                let result = timeout(write_timeout, async {
                    let mut writer = client.writer.lock().await;
                    writer.write_all(bytes).await
                })
                .await;
                (client, result)
            }
        });

        let mut report = BroadcastReport::default();
        for (client, result) in join_all(writes).await {
            let reason = match result {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("write timed out after {:?}", write_timeout),
            };
            if self.registry.remove(client.id).is_some() {
                report.dropped += 1;
                warn!(client = client.id, peer = %client.peer, reason = %reason, "Dropping client");
            }
        }

        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            bytes = bytes.len(),
            "Broadcast tick"
        );
        report
    }

    /// Closes every client connection.
    pub async fn shutdown(&self) {
        let clients = self.registry.drain();
        let count = clients.len();
        let write_timeout = self.config.write_timeout;

        join_all(clients.iter().map(|client| async move {
            let mut writer = client.writer.lock().await;
            let _ = timeout(write_timeout, writer.shutdown()).await;
        }))
        .await;

        info!(clients = count, "NMEA server closed client connections");
    }
}

async fn accept_loop(listener: TcpListener, registry: Arc<ClientRegistry>, shutdown: CancellationToken) {
    info!(addr = ?listener.local_addr().ok(), "Accepting NMEA clients");

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
                    }
                    let (reader, writer) = stream.into_split();
                    let cancel = shutdown.child_token();
                    let id = registry.insert(peer, writer, cancel.clone());
                    info!(client = id, peer = %peer, clients = registry.len(), "Client connected");

                    tokio::spawn(watch_client(reader, id, peer, Arc::clone(&registry), cancel));
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            },
        }
    }

    info!("Stopped accepting NMEA clients");
}

/// Reads and discards client input until the peer disconnects, then removes
/// the client from the registry. Returns early, dropping the read half, once
/// `cancel` fires: on shutdown or when a broadcast removed the client.
async fn watch_client(
    mut reader: OwnedReadHalf,
    id: ClientId,
    peer: SocketAddr,
    registry: Arc<ClientRegistry>,
    cancel: CancellationToken,
) {
    let mut buf = [0u8; DISCARD_BUFFER_SIZE];
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(client = id, "Client watcher stopped");
                return;
            }
            read = reader.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!(client = id, error = %e, "Client read failed");
                    break;
                }
            },
        }
    }

    if registry.remove(id).is_some() {
        info!(client = id, peer = %peer, clients = registry.len(), "Client disconnected");
    }
}
