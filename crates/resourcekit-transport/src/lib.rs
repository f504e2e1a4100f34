//! Transport abstractions for resourcekit.
//!
//! Transports move [`Message`](resourcekit_core::protocol::Message)s
//! between a client and the server runtime.
//!
//! | Transport | Use Case |
//! |-----------|----------|
//! | [`stdio::StdioTransport`] | Subprocess servers speaking line-delimited JSON |
//! | [`memory::MemoryTransport`] | Testing and in-process communication |
//!
//! # Example
//!
//! ```rust
//! use resourcekit_transport::{MemoryTransport, Transport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), resourcekit_transport::TransportError> {
//! let (client, server) = MemoryTransport::pair();
//! client
//!     .send(resourcekit_core::Request::new(1, "resources/list").into())
//!     .await?;
//! assert!(server.recv().await?.is_some());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod stdio;
pub mod traits;

pub use error::TransportError;
pub use memory::MemoryTransport;
pub use stdio::StdioTransport;
pub use traits::{Transport, TransportMetadata};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::TransportError;
    pub use crate::memory::MemoryTransport;
    pub use crate::stdio::StdioTransport;
    pub use crate::traits::{Transport, TransportMetadata};
}
