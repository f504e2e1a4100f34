//! Newline-delimited JSON over stdin/stdout.
//!
//! Each message is serialized as a single line of JSON followed by `\n`.
//! Blank lines are skipped. Logging must go to stderr so it does not
//! interleave with replies.
//!
//! Lines are read as bytes with a length limit. Invalid UTF-8 and invalid
//! JSON are both reported as [`TransportError::Json`]; a line over the limit
//! is skipped through its newline and reported as
//! [`TransportError::MessageTooLarge`]. Neither ends the stream.
//!
//! End of input only ends the read side: replies to requests still in
//! flight can be written until [`Transport::close`] is called.

use crate::error::TransportError;
use crate::traits::{Transport, TransportMetadata};
use async_lock::Mutex;
use resourcekit_core::protocol::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Maximum allowed message size (16 MB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A transport reading requests from one stream and writing replies to another.
pub struct StdioTransport<R, W> {
    reader: Mutex<BufReader<R>>,
    writer: Mutex<W>,
    connected: AtomicBool,
    max_message_size: usize,
    metadata: TransportMetadata,
}

impl StdioTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Create a transport over the process's stdin/stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
            writer: Mutex::new(tokio::io::stdout()),
            connected: AtomicBool::new(true),
            max_message_size: MAX_MESSAGE_SIZE,
            metadata: TransportMetadata::new("stdio")
                .remote_addr("stdin")
                .local_addr("stdout")
                .connected_now(),
        }
    }
}

impl Default for StdioTransport<tokio::io::Stdin, tokio::io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a transport with custom streams.
    ///
    /// Useful for tests with `tokio::io::duplex`.
    #[must_use]
    pub fn with_streams(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader)),
            writer: Mutex::new(writer),
            connected: AtomicBool::new(true),
            max_message_size: MAX_MESSAGE_SIZE,
            metadata: TransportMetadata::new("stdio")
                .remote_addr("custom")
                .local_addr("custom")
                .connected_now(),
        }
    }
}

impl<R, W> StdioTransport<R, W> {
    /// Set the largest line accepted or written, in bytes.
    #[must_use]
    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    /// The largest line accepted or written, in bytes.
    #[must_use]
    pub const fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin,
{
    /// Read one line into `buf`, stopping after `max + 1` bytes.
    ///
    /// Returns `false` at end of input.
    async fn read_bounded_line(
        reader: &mut BufReader<R>,
        buf: &mut Vec<u8>,
        max: usize,
    ) -> Result<bool, TransportError> {
        let limit = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
        let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
        Ok(read > 0)
    }

    /// Consume input up to and including the next newline.
    async fn discard_line(reader: &mut BufReader<R>) -> Result<(), TransportError> {
        loop {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    reader.consume(newline + 1);
                    return Ok(());
                }
                None => {
                    let len = available.len();
                    reader.consume(len);
                }
            }
        }
    }
}

impl<R, W> Transport for StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send + Sync,
    W: AsyncWrite + Unpin + Send + Sync,
{
    type Error = TransportError;

    async fn send(&self, msg: Message) -> Result<(), Self::Error> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let json = serde_json::to_string(&msg)?;
        if json.len() > self.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: json.len(),
                max: self.max_message_size,
            });
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        Ok(())
    }

    async fn recv(&self) -> Result<Option<Message>, Self::Error> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let mut reader = self.reader.lock().await;
        let max = self.max_message_size;

        loop {
            let mut line = Vec::new();
            if !Self::read_bounded_line(&mut reader, &mut line, max).await? {
                return Ok(None);
            }

            if line.len() > max && line.last() != Some(&b'\n') {
                Self::discard_line(&mut reader).await?;
                tracing::debug!(max, "discarded oversized line");
                return Err(TransportError::MessageTooLarge {
                    size: line.len(),
                    max,
                });
            }

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            tracing::trace!(bytes = trimmed.len(), "received line");
            let msg: Message = serde_json::from_slice(trimmed)?;
            return Ok(Some(msg));
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.connected.store(false, Ordering::SeqCst);
        let mut writer = self.writer.lock().await;
        writer.flush().await?;
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
    use resourcekit_core::protocol::{Reply, RequestId};
    use tokio::io::{AsyncReadExt, duplex};

    #[tokio::test]
    async fn test_reads_lines_and_skips_blanks() {
        let input: &[u8] = b"\n{\"id\":1,\"method\":\"resources/list\"}\n\n";
        let transport = StdioTransport::with_streams(input, Vec::<u8>::new());

        match transport.recv().await.unwrap() {
            Some(Message::Request(req)) => assert_eq!(req.method, "resources/list"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(transport.recv().await.unwrap().is_none());
        assert!(transport.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_keeps_write_side_open() {
        let (writer, mut reader) = duplex(1024);
        let transport = StdioTransport::with_streams(tokio::io::empty(), writer);

        assert!(transport.recv().await.unwrap().is_none());
        assert!(transport.is_connected());
        transport
            .send(Reply::success(RequestId::Number(1), serde_json::json!({})).into())
            .await
            .unwrap();
        transport.close().await.unwrap();
        assert!(!transport.is_connected());
        drop(transport);

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "{\"id\":1,\"result\":{}}\n");
    }

    #[tokio::test]
    async fn test_malformed_line_does_not_poison_stream() {
        let input: &[u8] = b"not json\n{\"id\":2,\"method\":\"resources/list\"}\n";
        let transport = StdioTransport::with_streams(input, Vec::<u8>::new());

        let err = transport.recv().await.unwrap_err();
        assert!(err.is_message_error());
        assert!(matches!(
            transport.recv().await.unwrap(),
            Some(Message::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_send_writes_one_line() {
        let (writer, mut reader) = duplex(1024);
        let transport = StdioTransport::with_streams(tokio::io::empty(), writer);

        transport
            .send(Reply::success(RequestId::Number(7), serde_json::json!({"ok": true})).into())
            .await
            .unwrap();
        drop(transport);

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "{\"id\":7,\"result\":{\"ok\":true}}\n");
    }

    #[test]
    fn test_max_message_size() {
        assert_eq!(MAX_MESSAGE_SIZE, 16 * 1024 * 1024);
        let transport = StdioTransport::with_streams(tokio::io::empty(), tokio::io::sink());
        assert_eq!(transport.max_message_size(), MAX_MESSAGE_SIZE);
        assert_eq!(transport.with_max_message_size(64).max_message_size(), 64);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_message_error() {
        let input: &[u8] = b"{\"id\":1,\"method\":\"\xff\xfe\"}\n{\"id\":2,\"method\":\"resources/list\"}\n";
        let transport = StdioTransport::with_streams(input, Vec::<u8>::new());

        let err = transport.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::Json(_)));
        assert!(err.is_message_error());
        match transport.recv().await.unwrap() {
            Some(Message::Request(req)) => assert_eq!(req.id, RequestId::Number(2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped() {
        let mut input = vec![b'x'; 200];
        input.extend_from_slice(b"\n{\"id\":3,\"method\":\"resources/list\"}\n");
        let transport =
            StdioTransport::with_streams(input.as_slice(), Vec::<u8>::new()).with_max_message_size(64);

        let err = transport.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::MessageTooLarge { max: 64, .. }));
        assert!(err.is_message_error());
        match transport.recv().await.unwrap() {
            Some(Message::Request(req)) => assert_eq!(req.id, RequestId::Number(3)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(transport.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let line = b"{\"id\":4,\"method\":\"resources/list\"}";
        let mut input = line.to_vec();
        input.push(b'\n');
        let transport =
            StdioTransport::with_streams(input.as_slice(), Vec::<u8>::new()).with_max_message_size(line.len());

        assert!(matches!(
            transport.recv().await.unwrap(),
            Some(Message::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_line_at_eof() {
        let input = vec![b'y'; 100];
        let transport =
            StdioTransport::with_streams(input.as_slice(), Vec::<u8>::new()).with_max_message_size(10);

        assert!(matches!(
            transport.recv().await.unwrap_err(),
            TransportError::MessageTooLarge { .. }
        ));
        assert!(transport.recv().await.unwrap().is_none());
    }
}
