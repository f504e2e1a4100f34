//! End-to-end tests running the serve loop over a line-delimited stream.

use resourcekit::error::codes;
use resourcekit::prelude::*;
use resourcekit_testing::fixtures::sample_server;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

async fn read_reply<R: tokio::io::AsyncBufRead + Unpin>(lines: &mut R) -> Reply {
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(5), lines.read_line(&mut line))
        .await
        .expect("timed out waiting for reply line")
        .unwrap();
    serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn test_stdio_round_trip_and_eof() {
    let (mut client_write, server_read) = duplex(4096);
    let (server_write, client_read) = duplex(4096);
    let mut client_read = BufReader::new(client_read);

    let transport = StdioTransport::with_streams(server_read, server_write);
    let serving = tokio::spawn(sample_server().serve(transport, CancellationToken::new()));

    client_write
        .write_all(b"{\"id\":1,\"method\":\"resources/read\",\"params\":{\"uri\":\"db://users/42\"}}\n")
        .await
        .unwrap();
    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, Some(RequestId::Number(1)));
    let result = reply.result.unwrap();
    assert_eq!(result["contents"][0]["uri"], "db://users/42");
    assert_eq!(result["contents"][0]["mimeType"], "application/json");

    // End of input with a request still pending: the reply is still written.
    client_write
        .write_all(b"{\"id\":\"last\",\"method\":\"resources/list\"}\n")
        .await
        .unwrap();
    drop(client_write);

    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, Some(RequestId::from("last")));
    assert!(!reply.is_error());

    let outcome = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop at end of input")
        .unwrap();
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_malformed_line_gets_parse_error_and_loop_continues() {
    let (mut client_write, server_read) = duplex(4096);
    let (server_write, client_read) = duplex(4096);
    let mut client_read = BufReader::new(client_read);

    let transport = StdioTransport::with_streams(server_read, server_write);
    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(sample_server().serve(transport, shutdown.clone()));

    client_write.write_all(b"{not json}\n").await.unwrap();
    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, None);
    assert_eq!(reply.error.map(|e| e.code), Some(codes::PARSE_ERROR));

    client_write
        .write_all(b"{\"id\":2,\"method\":\"resources/read\",\"params\":{\"uri\":\"config://settings\"}}\n")
        .await
        .unwrap();
    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, Some(RequestId::Number(2)));
    assert!(!reply.is_error());

    shutdown.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop on shutdown")
        .unwrap();
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_invalid_utf8_gets_parse_error_and_loop_continues() {
    let (mut client_write, server_read) = duplex(4096);
    let (server_write, client_read) = duplex(4096);
    let mut client_read = BufReader::new(client_read);

    let transport = StdioTransport::with_streams(server_read, server_write);
    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(sample_server().serve(transport, shutdown.clone()));

    client_write
        .write_all(b"{\"id\":1,\"method\":\"\xff\xfe\"}\n")
        .await
        .unwrap();
    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, None);
    assert_eq!(reply.error.map(|e| e.code), Some(codes::PARSE_ERROR));

    client_write
        .write_all(b"{\"id\":2,\"method\":\"resources/list\"}\n")
        .await
        .unwrap();
    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, Some(RequestId::Number(2)));
    assert!(!reply.is_error());

    shutdown.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop on shutdown")
        .unwrap();
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_incomplete_envelopes_get_parse_errors() {
    let (mut client_write, server_read) = duplex(4096);
    let (server_write, client_read) = duplex(4096);
    let mut client_read = BufReader::new(client_read);

    let transport = StdioTransport::with_streams(server_read, server_write);
    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(sample_server().serve(transport, shutdown.clone()));

    let lines: [&[u8]; 3] = [
        b"{\"id\":1,\"method\":5}\n",
        b"{\"method\":\"resources/list\"}\n",
        b"{}\n",
    ];
    for line in lines {
        client_write.write_all(line).await.unwrap();
        let reply = read_reply(&mut client_read).await;
        assert_eq!(reply.id, None, "reply to {}", String::from_utf8_lossy(line));
        assert_eq!(reply.error.map(|e| e.code), Some(codes::PARSE_ERROR));
    }

    client_write
        .write_all(b"{\"id\":4,\"method\":\"resources/read\",\"params\":{\"uri\":\"config://settings\"}}\n")
        .await
        .unwrap();
    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, Some(RequestId::Number(4)));
    assert!(!reply.is_error());

    shutdown.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop on shutdown")
        .unwrap();
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_oversized_line_gets_invalid_request_and_loop_continues() {
    let (mut client_write, server_read) = duplex(4096);
    let (server_write, client_read) = duplex(4096);
    let mut client_read = BufReader::new(client_read);

    let transport = StdioTransport::with_streams(server_read, server_write).with_max_message_size(64);
    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(sample_server().serve(transport, shutdown.clone()));

    let mut oversized = format!(
        "{{\"id\":1,\"method\":\"resources/read\",\"params\":{{\"uri\":\"file://{}\"}}}}",
        "a".repeat(500)
    )
    .into_bytes();
    oversized.push(b'\n');
    client_write.write_all(&oversized).await.unwrap();
    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, None);
    assert_eq!(reply.error.map(|e| e.code), Some(codes::INVALID_REQUEST));

    client_write
        .write_all(b"{\"id\":2,\"method\":\"resources/list\"}\n")
        .await
        .unwrap();
    let reply = read_reply(&mut client_read).await;
    assert_eq!(reply.id, Some(RequestId::Number(2)));
    assert!(!reply.is_error());

    shutdown.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve loop did not stop on shutdown")
        .unwrap();
    assert!(outcome.is_ok());
}
