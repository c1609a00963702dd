//! Connected client registry.
//!
//! The registry is the only state shared between the accept loop, the
//! per-client lifecycle tasks and the broadcaster. It is guarded by a single
//! synchronous lock that is never held across an await: broadcasters take a
//! snapshot of the handles and write through each handle's own async lock.
//!
//! Every handle carries a cancellation token for its connection. Removing a
//! client from the registry cancels it, which ends the task reading from
//! that connection.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::tcp::OwnedWriteHalf;
use tokio_util::sync::CancellationToken;

/// Connection identifier, unique for the lifetime of the server.
pub type ClientId = u64;

/// Shared write half of a client connection.
pub type ClientWriter = Arc<tokio::sync::Mutex<OwnedWriteHalf>>;

/// A registered client.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ClientId,
    pub peer: SocketAddr,
    pub writer: ClientWriter,
    /// Cancelled once the client leaves the registry.
    pub cancel: CancellationToken,
}

/// Set of live client write handles.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, ClientHandle>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its id. `cancel` is cancelled
    /// when the client is removed or drained.
    pub fn insert(&self, peer: SocketAddr, writer: OwnedWriteHalf, cancel: CancellationToken) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = ClientHandle {
            id,
            peer,
            writer: Arc::new(tokio::sync::Mutex::new(writer)),
            cancel,
        };
        self.clients.lock().insert(id, handle);
        id
    }

    /// Removes a client; returns its handle if it was still registered.
    pub fn remove(&self, id: ClientId) -> Option<ClientHandle> {
        let handle = self.clients.lock().remove(&id)?;
        handle.cancel.cancel();
        Some(handle)
    }

    /// Point-in-time copy of all handles.
    pub fn snapshot(&self) -> Vec<ClientHandle> {
        self.clients.lock().values().cloned().collect()
    }

    /// Removes and returns every client.
    pub fn drain(&self) -> Vec<ClientHandle> {
        let handles: Vec<ClientHandle> = self.clients.lock().drain().map(|(_, handle)| handle).collect();
        for handle in &handles {
            handle.cancel.cancel();
        }
        handles
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    async fn write_half() -> (OwnedWriteHalf, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        let (_, writer) = stream.into_split();
        (writer, peer)
    }

    #[tokio::test]
    async fn test_insert_remove_snapshot() {
        let registry = ClientRegistry::new();
        let (w1, p1) = write_half().await;
        let (w2, p2) = write_half().await;

        let a = registry.insert(p1, w1, CancellationToken::new());
        let b = registry.insert(p2, w2, CancellationToken::new());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.snapshot().len(), 2);

        assert!(registry.remove(a).is_some());
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.len(), 1);

        let drained = registry.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id, b);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_removal_cancels_client_token() {
        let registry = ClientRegistry::new();
        let (w1, p1) = write_half().await;
        let (w2, p2) = write_half().await;
        let first = CancellationToken::new();
        let second = CancellationToken::new();

        let a = registry.insert(p1, w1, first.clone());
        registry.insert(p2, w2, second.clone());
        assert!(!first.is_cancelled());

        registry.remove(a);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        registry.drain();
        assert!(second.is_cancelled());
    }
}
