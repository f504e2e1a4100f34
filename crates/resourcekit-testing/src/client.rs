//! In-process test client.
//!
//! [`TestClient`] serves a [`Server`] over a [`MemoryTransport`] pair in a
//! background task and exposes request helpers for the client side.
//!
//! ```rust
//! use resourcekit_testing::{TestClient, assert_text_contents, fixtures};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let client = TestClient::start(fixtures::sample_server());
//! let reply = client.read("db://users/7").await;
//! assert_text_contents(&reply, "user-7");
//! client.shutdown().await.unwrap();
//! # }
//! ```

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use resourcekit_core::error::Error;
use resourcekit_core::protocol::{Message, Reply, Request, RequestId, methods};
use resourcekit_server::Server;
use resourcekit_transport::{MemoryTransport, Transport};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long a request waits for its reply before the test fails.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// A client driving a server running in a background task.
pub struct TestClient {
    transport: MemoryTransport,
    shutdown: CancellationToken,
    serving: JoinHandle<Result<(), Error>>,
    next_id: AtomicI64,
    timeout: Duration,
}

impl TestClient {
    /// Start serving `server` and connect a client to it.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(server: Server) -> Self {
        let (transport, server_side) = MemoryTransport::pair();
        let shutdown = CancellationToken::new();
        let serving = tokio::spawn(server.serve(server_side, shutdown.clone()));
        Self {
            transport,
            shutdown,
            serving,
            next_id: AtomicI64::new(1),
            timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Change the reply timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allocate the next request ID.
    pub fn next_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// The shutdown token of the background serve loop.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Send a message without waiting for a reply.
    pub async fn send(&self, message: impl Into<Message>) -> Result<(), Error> {
        self.transport.send(message.into()).await.map_err(Error::from)
    }

    /// Wait for the next reply, whatever request it answers.
    ///
    /// # Panics
    ///
    /// Panics on timeout, on transport failure, or if the connection closes.
    pub async fn next_reply(&self) -> Reply {
        let received = tokio::time::timeout(self.timeout, self.transport.recv())
            .await
            .unwrap_or_else(|_| panic!("No reply within {:?}", self.timeout));
        match received {
            Ok(Some(Message::Reply(reply))) => reply,
            Ok(Some(Message::Request(request))) => {
                panic!("Server sent a request: {}", request.method)
            }
            Ok(None) => panic!("Connection closed while waiting for a reply"),
            Err(e) => panic!("Transport error while waiting for a reply: {e}"),
        }
    }

    /// Send a request and wait for its reply.
    ///
    /// Replies to other requests arriving in the meantime are discarded, so
    /// use [`send`](Self::send) and [`next_reply`](Self::next_reply) when
    /// several requests are in flight.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`next_reply`](Self::next_reply).
    pub async fn request(&self, request: Request) -> Reply {
        let id = request.id.clone();
        if let Err(e) = self.send(request).await {
            panic!("Failed to send request {id}: {e}");
        }
        loop {
            let reply = self.next_reply().await;
            if reply.id.as_ref() == Some(&id) {
                return reply;
            }
        }
    }

    /// Read a resource.
    pub async fn read(&self, uri: &str) -> Reply {
        self.request(Request::read(self.next_id(), uri)).await
    }

    /// List literal resources.
    pub async fn list(&self) -> Reply {
        self.request(Request::new(self.next_id(), methods::RESOURCES_LIST))
            .await
    }

    /// List resource templates.
    pub async fn list_templates(&self) -> Reply {
        self.request(Request::new(
            self.next_id(),
            methods::RESOURCES_TEMPLATES_LIST,
        ))
        .await
    }

    /// Cancel the serve loop and wait for it to finish.
    pub async fn shutdown(self) -> Result<(), Error> {
        self.shutdown.cancel();
        self.join().await
    }

    /// Drop the client side of the connection and wait for the serve loop
    /// to notice.
    pub async fn disconnect(self) -> Result<(), Error> {
        let Self {
            transport, serving, ..
        } = self;
        drop(transport);
        serving
            .await
            .map_err(|e| Error::internal(format!("Serve task failed: {e}")))?
    }

    async fn join(self) -> Result<(), Error> {
        self.serving
            .await
            .map_err(|e| Error::internal(format!("Serve task failed: {e}")))?
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("next_id", &self.next_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
