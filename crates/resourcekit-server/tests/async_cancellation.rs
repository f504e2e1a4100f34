//! Async cancellation tests.
//!
//! Tests verifying how the serve loop and in-flight handlers react to the
//! shutdown token.

use resourcekit_core::error::{Error, codes};
use resourcekit_core::protocol::{Message, Reply, Request, RequestId};
use resourcekit_core::types::ResourceContents;
use resourcekit_server::prelude::*;
use resourcekit_transport::{MemoryTransport, Transport};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// =============================================================================
// Helpers
// =============================================================================

/// Build a server whose `wait://{name}` handler blocks until cancelled.
/// `started` counts handler invocations.
fn waiting_server(started: Arc<AtomicU32>, config: RuntimeConfig) -> Server {
    ServerBuilder::new(ServerInfo::new("cancellation", "0.1.0"))
        .config(config)
        .resource(
            "wait://{name}",
            ResourceDefinition::new("Wait", move |ctx, uri, _params| {
                started.fetch_add(1, Ordering::SeqCst);
                async move {
                    ctx.cancelled().await;
                    Ok(ResourceContents::text(uri, "late"))
                }
            }),
        )
        .unwrap()
        .resource(
            "config://settings",
            ResourceDefinition::new("Settings", |_ctx, uri, _params| async move {
                Ok(ResourceContents::text(uri, "debug=true"))
            }),
        )
        .unwrap()
        .build()
}

async fn recv_reply(client: &MemoryTransport) -> Reply {
    match tokio::time::timeout(Duration::from_secs(5), client.recv())
        .await
        .expect("timed out waiting for reply")
        .unwrap()
    {
        Some(Message::Reply(reply)) => reply,
        other => panic!("expected reply, got {other:?}"),
    }
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[tokio::test]
async fn test_cancel_before_any_message_returns_ok() {
    let (_client, transport) = MemoryTransport::pair();
    let server = waiting_server(Arc::default(), RuntimeConfig::default());

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let result = server.serve(transport, shutdown).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cancel_stops_idle_loop() {
    let (_client, transport) = MemoryTransport::pair();
    let server = waiting_server(Arc::default(), RuntimeConfig::default());

    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server.serve(transport, shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!serving.is_finished());

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cancel_reaches_in_flight_handlers() {
    let started = Arc::new(AtomicU32::new(0));
    let (client, transport) = MemoryTransport::pair();
    let server = waiting_server(Arc::clone(&started), RuntimeConfig::default());

    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server.serve(transport, shutdown.clone()));

    client.send(Request::read(1, "wait://a").into()).await.unwrap();
    client.send(Request::read(2, "wait://b").into()).await.unwrap();

    // The fast resource still answers while the slow ones are pending.
    client
        .send(Request::read(3, "config://settings").into())
        .await
        .unwrap();
    let reply = recv_reply(&client).await;
    assert_eq!(reply.id, Some(RequestId::Number(3)));
    assert!(!reply.is_error());
    assert_eq!(started.load(Ordering::SeqCst), 2);

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop")
        .unwrap();
    assert!(result.is_ok());

    let mut ids = Vec::new();
    for _ in 0..2 {
        let reply = recv_reply(&client).await;
        assert_eq!(reply.error.as_ref().map(|e| e.code), Some(codes::REQUEST_CANCELLED));
        ids.push(reply.id.unwrap());
    }
    ids.sort_by_key(ToString::to_string);
    assert_eq!(ids, vec![RequestId::Number(1), RequestId::Number(2)]);
}

#[tokio::test]
async fn test_abort_mode_does_not_wait_for_handlers() {
    let (client, transport) = MemoryTransport::pair();
    let server = ServerBuilder::new(ServerInfo::new("abort", "0.1.0"))
        .config(RuntimeConfig::default().drain_in_flight(false))
        .resource(
            "stuck://{name}",
            ResourceDefinition::new("Stuck", |_ctx, _uri, _params| async move {
                // Ignores cancellation entirely.
                std::future::pending::<Result<ResourceContents, Error>>().await
            }),
        )
        .unwrap()
        .build();

    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server.serve(transport, shutdown.clone()));

    client.send(Request::read(1, "stuck://x").into()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop")
        .unwrap();
    assert!(result.is_ok());
}

// =============================================================================
// Connection Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_peer_disconnect_returns_ok() {
    let (client, transport) = MemoryTransport::pair();
    let server = waiting_server(Arc::default(), RuntimeConfig::default());

    let serving = tokio::spawn(server.serve(transport, CancellationToken::new()));
    drop(client);

    let result = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_closed_transport_is_an_error() {
    let (_client, transport) = MemoryTransport::pair();
    transport.close().await.unwrap();
    let server = waiting_server(Arc::default(), RuntimeConfig::default());

    let result = server.serve(transport, CancellationToken::new()).await;
    assert!(matches!(result, Err(Error::Transport { .. })));
}

// =============================================================================
// Concurrency Bound Tests
// =============================================================================

#[tokio::test]
async fn test_concurrency_bound_holds_back_requests() {
    let started = Arc::new(AtomicU32::new(0));
    let (client, transport) = MemoryTransport::pair();
    let server = waiting_server(
        Arc::clone(&started),
        RuntimeConfig::default().max_concurrent_requests(1),
    );

    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server.serve(transport, shutdown.clone()));

    // The only permit is taken by the blocked handler, so the fast request
    // cannot run until shutdown.
    client.send(Request::read(1, "wait://a").into()).await.unwrap();
    client
        .send(Request::read(2, "config://settings").into())
        .await
        .unwrap();

    let pending = tokio::time::timeout(Duration::from_millis(50), client.recv()).await;
    assert!(pending.is_err(), "no reply expected while the permit is held");

    shutdown.cancel();
    serving.await.unwrap().unwrap();

    let reply = recv_reply(&client).await;
    assert_eq!(reply.id, Some(RequestId::Number(1)));
    assert_eq!(reply.error.map(|e| e.code), Some(codes::REQUEST_CANCELLED));
    assert_eq!(started.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Context Tests
// =============================================================================

#[tokio::test]
async fn test_context_child_of_shutdown() {
    let shutdown = CancellationToken::new();
    let ctx = Context::new(Some(RequestId::Number(1)), shutdown.child_token());
    let other = Context::new(Some(RequestId::Number(2)), shutdown.child_token());

    ctx.cancellation_token().cancel();
    assert!(ctx.is_cancelled());
    assert!(!other.is_cancelled());
    assert!(!shutdown.is_cancelled());

    shutdown.cancel();
    assert!(other.is_cancelled());
}

#[tokio::test]
async fn test_direct_read_with_cancelled_context() {
    let server = waiting_server(Arc::default(), RuntimeConfig::default());
    let ctx = Context::detached();
    ctx.cancellation_token().cancel();

    let err = server.read("config://settings", &ctx).await.unwrap_err();
    assert!(err.is_cancelled());
}
