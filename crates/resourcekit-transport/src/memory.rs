//! In-memory transport for testing.
//!
//! A connected pair of transports backed by channels. Messages sent on one
//! side are received on the other. Dropping one side ends the other side's
//! receive stream with `Ok(None)`. Each side tracks its own connection
//! state, so closing one side does not close its peer.
//!
//! # Example
//!
//! ```rust
//! use resourcekit_transport::{MemoryTransport, Transport};
//!
//! let (client, server) = MemoryTransport::pair();
//! assert!(client.is_connected());
//! assert!(server.is_connected());
//! ```

use crate::error::TransportError;
use crate::traits::{Transport, TransportMetadata};
use async_lock::Mutex;
use futures::channel::mpsc;
use resourcekit_core::protocol::Message;
use std::sync::atomic::{AtomicBool, Ordering};

/// An in-memory transport using channels.
pub struct MemoryTransport {
    sender: mpsc::Sender<Message>,
    receiver: Mutex<mpsc::Receiver<Message>>,
    connected: AtomicBool,
    metadata: TransportMetadata,
}

impl MemoryTransport {
    /// Create a connected pair of memory transports.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        Self::pair_with_capacity(32)
    }

    /// Create a connected pair with a specific buffer capacity.
    #[must_use]
    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(capacity);
        let (tx2, rx2) = mpsc::channel(capacity);

        let transport1 = Self {
            sender: tx2,
            receiver: Mutex::new(rx1),
            connected: AtomicBool::new(true),
            metadata: TransportMetadata::new("memory")
                .remote_addr("peer-1")
                .local_addr("peer-0")
                .connected_now(),
        };

        let transport2 = Self {
            sender: tx1,
            receiver: Mutex::new(rx2),
            connected: AtomicBool::new(true),
            metadata: TransportMetadata::new("memory")
                .remote_addr("peer-0")
                .local_addr("peer-1")
                .connected_now(),
        };

        (transport1, transport2)
    }
}

impl Transport for MemoryTransport {
    type Error = TransportError;

    async fn send(&self, msg: Message) -> Result<(), Self::Error> {
        use futures::SinkExt;

        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let mut sender = self.sender.clone();
        sender
            .send(msg)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn recv(&self) -> Result<Option<Message>, Self::Error> {
        use futures::StreamExt;

        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let mut receiver = self.receiver.lock().await;
        if let Some(msg) = receiver.next().await {
            Ok(Some(msg))
        } else {
            self.connected.store(false, Ordering::SeqCst);
            Ok(None)
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn metadata(&self) -> TransportMetadata {
        self.metadata.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resourcekit_core::protocol::{Reply, Request, RequestId};

    #[tokio::test]
    async fn test_memory_transport_pair() {
        let (client, server) = MemoryTransport::pair();

        assert!(client.is_connected());
        assert!(server.is_connected());
        assert_eq!(client.metadata().transport_type, "memory");
    }

    #[tokio::test]
    async fn test_send_receive() {
        let (client, server) = MemoryTransport::pair();

        client
            .send(Request::read(1, "db://users/42").into())
            .await
            .unwrap();

        match server.recv().await.unwrap().unwrap() {
            Message::Request(req) => assert_eq!(req.method, "resources/read"),
            Message::Reply(_) => panic!("Expected request"),
        }

        server
            .send(Reply::success(RequestId::Number(1), serde_json::json!({})).into())
            .await
            .unwrap();
        assert!(matches!(
            client.recv().await.unwrap(),
            Some(Message::Reply(_))
        ));
    }

    #[tokio::test]
    async fn test_drop_ends_stream() {
        let (client, server) = MemoryTransport::pair();
        drop(client);

        assert!(server.recv().await.unwrap().is_none());
        assert!(!server.is_connected());
    }

    #[tokio::test]
    async fn test_send_after_close() {
        let (client, _server) = MemoryTransport::pair();
        client.close().await.unwrap();

        let result = client.send(Request::new(1, "resources/list").into()).await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_leaves_peer_connected() {
        let (client, server) = MemoryTransport::pair();
        server.close().await.unwrap();

        assert!(client.is_connected());
        assert!(!server.is_connected());
    }
}
