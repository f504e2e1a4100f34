//! Resource serving for resourcekit.
//!
//! This crate holds the server side: a registry mapping literal URIs and
//! URI templates to handlers, a fluent builder, and a serve loop that runs
//! a server over any [`Transport`](resourcekit_transport::Transport) until
//! a cancellation token fires.
//!
//! # Overview
//!
//! Serving resources involves:
//!
//! 1. Describing each resource with a [`ResourceDefinition`] (name,
//!    optional description and MIME type, async handler)
//! 2. Registering definitions under patterns with [`ServerBuilder`]
//! 3. Calling [`Server::serve`] with a transport and a shutdown token
//!
//! # Example
//!
//! ```rust
//! use resourcekit_core::types::ResourceContents;
//! use resourcekit_server::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), resourcekit_core::Error> {
//! let server = ServerBuilder::new(ServerInfo::new("users", "1.0.0"))
//!     .resource(
//!         "db://users/{id}",
//!         ResourceDefinition::new("User", |_ctx, uri, params| async move {
//!             let id = params.require("id")?;
//!             Ok(ResourceContents::text(uri, format!("user {id}")))
//!         }),
//!     )?
//!     .build();
//!
//! let contents = server.read("db://users/42", &Context::detached()).await?;
//! assert_eq!(contents.as_text(), Some("user 42"));
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! Every request served over a transport gets a [`Context`] whose token is
//! a child of the serve loop's shutdown token. Cancelling the shutdown
//! token stops the loop and cancels every in-flight handler.

#![deny(missing_docs)]

pub mod builder;
pub mod config;
pub mod context;
pub mod handler;
pub mod registry;
pub mod server;

// Re-export commonly used types
pub use builder::{ServerBuilder, ServerInfo};
pub use config::RuntimeConfig;
pub use context::Context;
pub use handler::{BoxedResourceFn, HandlerFuture, ResourceDefinition, handler_fn};
pub use registry::{ResourceDescriptor, ResourceMatch, ResourceRegistry};
pub use server::{Server, ServerRuntime};
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::{ServerBuilder, ServerInfo};
    pub use crate::config::RuntimeConfig;
    pub use crate::context::Context;
    pub use crate::handler::ResourceDefinition;
    pub use crate::registry::ResourceRegistry;
    pub use crate::server::{Server, ServerRuntime};
    pub use tokio_util::sync::CancellationToken;
}
