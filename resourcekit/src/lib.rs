//! # resourcekit
//!
//! Serve Model Context Protocol resources from literal URIs and URI
//! templates.
//!
//! ## Features
//!
//! - **URI templates** such as `db://users/{id}` with named parameter capture
//! - **Deterministic resolution**: literals beat templates, then the most
//!   specific template wins
//! - **Async handlers** as plain closures receiving a cancellable context
//! - **Graceful shutdown** driven by a `CancellationToken`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resourcekit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let server = ServerBuilder::new(ServerInfo::new("users", "1.0.0"))
//!         .resource(
//!             "db://users/{id}",
//!             ResourceDefinition::new("User", |_ctx, uri, params| async move {
//!                 let id = params.require("id")?;
//!                 Ok(ResourceContents::text(uri, format!("user {id}")))
//!             })
//!             .mime_type("text/plain"),
//!         )?
//!         .build();
//!
//!     server.serve(StdioTransport::new(), CancellationToken::new()).await
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`resourcekit_core`] - Resource types, URI templates, envelope and errors
//! - [`resourcekit_transport`] - Transport abstraction, stdio and in-memory
//! - [`mod@resourcekit_server`] - Registry, builder and serve loop

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_name_repetitions)]

// Re-export all public items from core
pub use resourcekit_core::*;

// Re-export server types
pub use resourcekit_server::{
    CancellationToken, Context, ResourceDefinition, ResourceRegistry, RuntimeConfig, Server,
    ServerBuilder, ServerInfo, ServerRuntime,
};

// Re-export transport types
pub use resourcekit_transport::{MemoryTransport, StdioTransport, Transport, TransportMetadata};

pub mod prelude;

/// Server module re-exports
pub mod server {
    //! Server implementation types.
    pub use resourcekit_server::*;
}

/// Transport module re-exports
pub mod transport {
    //! Transport layer types.
    pub use resourcekit_transport::*;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;
        let _ = std::any::type_name::<Error>();
        let _ = std::any::type_name::<ServerBuilder>();
    }
}
