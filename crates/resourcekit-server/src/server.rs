//! Server and serve loop.
//!
//! A [`Server`] is the frozen result of [`ServerBuilder`](crate::ServerBuilder):
//! server info, runtime configuration and the resource registry. It can be
//! driven directly through [`Server::read`] and [`Server::dispatch`], or
//! attached to a transport with [`Server::serve`].
//!
//! # Serve loop
//!
//! [`ServerRuntime::run`] receives messages until one of:
//!
//! 1. The shutdown token is cancelled. In-flight handlers observe
//!    cancellation through their [`Context`], are drained (or aborted, see
//!    [`RuntimeConfig::drain_in_flight`]), the transport is closed and the
//!    loop returns `Ok(())`.
//! 2. The transport reports end of input. In-flight handlers finish and
//!    reply, then the loop returns `Ok(())`.
//! 3. The transport fails. The loop returns the error.
//!
//! Malformed messages are answered with an error reply and do not stop
//! the loop. Each request runs in its own task; the number of concurrently
//! running handlers is bounded by [`RuntimeConfig::max_concurrent_requests`].
//!
//! # Example
//!
//! ```rust
//! use resourcekit_core::protocol::{Message, Request};
//! use resourcekit_core::types::ResourceContents;
//! use resourcekit_server::{ResourceDefinition, ServerBuilder, ServerInfo};
//! use resourcekit_transport::{MemoryTransport, Transport};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), resourcekit_core::Error> {
//! let server = ServerBuilder::new(ServerInfo::new("demo", "1.0.0"))
//!     .resource(
//!         "config://settings",
//!         ResourceDefinition::new("Settings", |_ctx, uri, _params| async move {
//!             Ok(ResourceContents::text(uri, "debug=true"))
//!         }),
//!     )?
//!     .build();
//!
//! let (client, transport) = MemoryTransport::pair();
//! let shutdown = CancellationToken::new();
//! let serving = tokio::spawn(server.serve(transport, shutdown.clone()));
//!
//! client.send(Request::read(1, "config://settings").into()).await?;
//! let reply = client.recv().await?;
//! assert!(matches!(reply, Some(Message::Reply(r)) if !r.is_error()));
//!
//! shutdown.cancel();
//! assert!(serving.await.is_ok());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use resourcekit_core::error::Error;
use resourcekit_core::protocol::{Message, Method, Reply, Request};
use resourcekit_core::types::{
    ListResourceTemplatesResult, ListResourcesResult, ReadResourceResult, ResourceContents,
};
use resourcekit_transport::Transport;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::builder::ServerInfo;
use crate::config::RuntimeConfig;
use crate::context::Context;
use crate::registry::ResourceRegistry;

/// A built resource server.
#[derive(Debug, Clone)]
pub struct Server {
    info: ServerInfo,
    config: RuntimeConfig,
    registry: Arc<ResourceRegistry>,
}

impl Server {
    pub(crate) fn new(info: ServerInfo, config: RuntimeConfig, registry: Arc<ResourceRegistry>) -> Self {
        Self {
            info,
            config,
            registry,
        }
    }

    /// Server name and version.
    #[must_use]
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Runtime configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The resource registry.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Read a resource directly, bypassing any transport.
    pub async fn read(&self, uri: &str, ctx: &Context) -> Result<ResourceContents, Error> {
        self.registry.read(uri, ctx).await
    }

    /// Route a request to the registry and produce its result value.
    pub async fn handle(&self, request: &Request, ctx: &Context) -> Result<Value, Error> {
        match Method::parse(request)? {
            Method::ListResources => to_value(&ListResourcesResult {
                resources: self.registry.list(),
                next_cursor: None,
            }),
            Method::ListResourceTemplates => to_value(&ListResourceTemplatesResult {
                resource_templates: self.registry.list_templates(),
                next_cursor: None,
            }),
            Method::ReadResource(params) => {
                let contents = self.registry.read(&params.uri, ctx).await?;
                to_value(&ReadResourceResult {
                    contents: vec![contents],
                })
            }
        }
    }

    /// Handle a request to completion and build its reply.
    ///
    /// If `cancel` fires before the handler finishes, the handler future is
    /// dropped and a cancellation error is returned.
    pub async fn dispatch(&self, request: Request, cancel: CancellationToken) -> Reply {
        let ctx = Context::new(Some(request.id.clone()), cancel);
        tracing::debug!(method = %request.method, id = %request.id, "Handling request");

        let outcome = tokio::select! {
            biased;
            () = ctx.cancelled() => Err(Error::cancelled(request.method.clone())),
            result = self.handle(&request, &ctx) => result,
        };

        match outcome {
            Ok(result) => Reply::success(request.id, result),
            Err(e) => {
                tracing::debug!(id = %request.id, error = %e, "Request failed");
                Reply::error(Some(request.id), e)
            }
        }
    }

    /// Serve requests from `transport` until `shutdown` is cancelled or the
    /// transport ends.
    pub async fn serve<Tr>(self, transport: Tr, shutdown: CancellationToken) -> Result<(), Error>
    where
        Tr: Transport + 'static,
        Tr::Error: Into<Error>,
    {
        ServerRuntime::new(self, transport, shutdown).run().await
    }
}

fn to_value<T: Serialize>(result: &T) -> Result<Value, Error> {
    serde_json::to_value(result)
        .map_err(|e| Error::internal(format!("Failed to serialize result: {e}")))
}

/// Runs a [`Server`] over a transport.
pub struct ServerRuntime<Tr> {
    server: Arc<Server>,
    transport: Arc<Tr>,
    shutdown: CancellationToken,
}

impl<Tr> ServerRuntime<Tr>
where
    Tr: Transport + 'static,
    Tr::Error: Into<Error>,
{
    /// Create a runtime.
    pub fn new(server: Server, transport: Tr, shutdown: CancellationToken) -> Self {
        Self {
            server: Arc::new(server),
            transport: Arc::new(transport),
            shutdown,
        }
    }

    /// The token that stops this runtime.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Run the serve loop.
    pub async fn run(&self) -> Result<(), Error> {
        let permits = Arc::new(Semaphore::new(self.server.config().permits()));
        let mut in_flight = JoinSet::new();

        tracing::info!(
            server = %self.server.info().name,
            transport = %self.transport.metadata().transport_type,
            "Serving resources"
        );

        let outcome = loop {
            reap(&mut in_flight);

            let received = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => {
                    tracing::info!("Shutdown requested");
                    break Ok(());
                }
                received = self.transport.recv() => received,
            };

            match received {
                Ok(Some(Message::Request(request))) => {
                    let permit = tokio::select! {
                        biased;
                        () = self.shutdown.cancelled() => {
                            tracing::info!("Shutdown requested");
                            break Ok(());
                        }
                        permit = Arc::clone(&permits).acquire_owned() => permit,
                    };
                    let Ok(permit) = permit else {
                        break Ok(());
                    };

                    let server = Arc::clone(&self.server);
                    let transport = Arc::clone(&self.transport);
                    let cancel = self.shutdown.child_token();
                    in_flight.spawn(async move {
                        let reply = server.dispatch(request, cancel).await;
                        if let Err(e) = transport.send(Message::Reply(reply)).await {
                            tracing::warn!(error = %e, "Failed to send reply");
                        }
                        drop(permit);
                    });
                }
                Ok(Some(Message::Reply(_))) => {
                    tracing::warn!("Received unexpected reply message");
                }
                Ok(None) => {
                    tracing::info!("Connection closed");
                    break Ok(());
                }
                Err(e) => {
                    let err: Error = e.into();
                    if !err.is_recoverable() {
                        tracing::error!(error = %err, "Transport error");
                        break Err(err);
                    }
                    tracing::warn!(error = %err, "Rejected malformed message");
                    if let Err(e) = self.transport.send(Message::Reply(Reply::error(None, err))).await {
                        let err: Error = e.into();
                        tracing::error!(error = %err, "Failed to send error reply");
                        break Err(err);
                    }
                }
            }
        };

        self.finish(in_flight).await;
        outcome
    }

    async fn finish(&self, mut in_flight: JoinSet<()>) {
        if !in_flight.is_empty() {
            if self.shutdown.is_cancelled() && !self.server.config().drain_in_flight {
                tracing::debug!(count = in_flight.len(), "Aborting in-flight requests");
                in_flight.abort_all();
            } else {
                tracing::debug!(count = in_flight.len(), "Draining in-flight requests");
            }
            while let Some(joined) = in_flight.join_next().await {
                log_join(joined);
            }
        }

        if let Err(e) = self.transport.close().await {
            tracing::warn!(error = %e, "Failed to close transport");
        }
    }
}

fn reap(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.try_join_next() {
        log_join(joined);
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    match joined {
        Err(e) if e.is_panic() => tracing::error!(error = %e, "Request handler panicked"),
        _ => {}
    }
}

impl<Tr> std::fmt::Debug for ServerRuntime<Tr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRuntime")
            .field("server", &self.server.info().name)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}
