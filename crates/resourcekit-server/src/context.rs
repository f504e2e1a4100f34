//! Request context for resource handlers.
//!
//! Every handler invocation receives a [`Context`] carrying the request
//! ID (when the call came through a transport) and a cancellation token.
//! Handlers that perform blocking or long-running work should check
//! [`Context::is_cancelled`] or await [`Context::cancelled`] at their
//! suspension points.
//!
//! The context is owned and cheap to clone, so handlers can move it into
//! the futures they return.
//!
//! # Example
//!
//! ```rust
//! use resourcekit_core::protocol::RequestId;
//! use resourcekit_server::Context;
//! use tokio_util::sync::CancellationToken;
//!
//! let shutdown = CancellationToken::new();
//! let ctx = Context::new(Some(RequestId::Number(1)), shutdown.child_token());
//!
//! assert!(!ctx.is_cancelled());
//! shutdown.cancel();
//! assert!(ctx.is_cancelled());
//! ```

use resourcekit_core::protocol::RequestId;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Request context passed to resource handlers.
#[derive(Debug, Clone)]
pub struct Context {
    request_id: Option<RequestId>,
    cancel: CancellationToken,
}

impl Context {
    /// Create a context for a request.
    #[must_use]
    pub fn new(request_id: Option<RequestId>, cancel: CancellationToken) -> Self {
        Self { request_id, cancel }
    }

    /// Create a context that is never cancelled from outside.
    ///
    /// Used for direct registry reads that bypass the serve loop.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(None, CancellationToken::new())
    }

    /// The ID of the request being served, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Check if the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Get a future that completes when the request is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Get the cancellation token for this context.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::detached()
    }
}
