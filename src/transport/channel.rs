//! # Byte Channel
//!
//! Duplex, ordered, reliable byte stream over a concrete transport.
//!
//! A [`ByteChannel`] owns one read half and one write half of some
//! underlying transport and tracks a monotonic 64-bit cursor per direction.
//! `send` and `recv` transfer exactly the requested number of bytes or fail:
//! partial transfers are retried here and never surfaced to the caller,
//! while zero progress from the transport is a fatal
//! [`ProtocolError::Transport`].
//!
//! A channel is exclusively owned by one session. There is no internal
//! locking; calls must come from the single task driving the session.

use crate::error::{constants, ProtocolError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

type Reader = Box<dyn AsyncRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// A duplex byte stream with per-direction cursors.
pub struct ByteChannel {
    reader: Reader,
    writer: Writer,
    send_offset: u64,
    recv_offset: u64,
}

impl ByteChannel {
    /// Build a channel from independent read and write halves.
    pub fn from_parts<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            send_offset: 0,
            recv_offset: 0,
        }
    }

    /// Build a channel from a single bidirectional stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::from_parts(reader, writer)
    }

    /// Write all of `data`, retrying partial transfers.
    ///
    /// The writer is flushed before returning: a buffered transport
    /// (stdout in particular) must hand the bytes to the peer, not hold
    /// them until the channel closes.
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut done = 0;
        while done < data.len() {
            let n = self.writer.write(&data[done..]).await?;
            if n == 0 {
                return Err(ProtocolError::Transport(
                    constants::ERR_SEND_NO_PROGRESS.into(),
                ));
            }
            self.send_offset = self
                .send_offset
                .checked_add(n as u64)
                .ok_or(ProtocolError::OffsetOverflow)?;
            done += n;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Fill all of `buf`, retrying partial transfers.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut done = 0;
        while done < buf.len() {
            let n = self.reader.read(&mut buf[done..]).await?;
            if n == 0 {
                return Err(ProtocolError::Transport(
                    constants::ERR_RECV_NO_PROGRESS.into(),
                ));
            }
            self.recv_offset = self
                .recv_offset
                .checked_add(n as u64)
                .ok_or(ProtocolError::OffsetOverflow)?;
            done += n;
        }
        Ok(())
    }

    /// Cumulative bytes written since the channel was opened.
    pub fn send_offset(&self) -> u64 {
        self.send_offset
    }

    /// Cumulative bytes read since the channel was opened.
    pub fn recv_offset(&self) -> u64 {
        self.recv_offset
    }

    /// Flush and shut down the write side, consuming the channel.
    ///
    /// The read half is dropped; an orderly TCP shutdown reaches the peer
    /// before the socket closes.
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

impl std::fmt::Debug for ByteChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteChannel")
            .field("send_offset", &self.send_offset)
            .field("recv_offset", &self.recv_offset)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn loopback() -> (ByteChannel, ByteChannel) {
        let (a, b) = tokio::io::duplex(256);
        (ByteChannel::from_stream(a), ByteChannel::from_stream(b))
    }

    #[tokio::test]
    async fn test_send_recv_exact() {
        let (mut a, mut b) = loopback();

        a.send(b"hello channel").await.unwrap();

        let mut buf = [0u8; 13];
        b.recv(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello channel");
    }

    #[tokio::test]
    async fn test_offsets_track_bytes_transferred() {
        let (mut a, mut b) = loopback();
        assert_eq!(a.send_offset(), 0);
        assert_eq!(b.recv_offset(), 0);

        a.send(&[0xAB; 40]).await.unwrap();
        assert_eq!(a.send_offset(), 40);
        assert_eq!(a.recv_offset(), 0);

        let mut buf = [0u8; 25];
        b.recv(&mut buf).await.unwrap();
        assert_eq!(b.recv_offset(), 25);

        let mut rest = [0u8; 15];
        b.recv(&mut rest).await.unwrap();
        assert_eq!(b.recv_offset(), 40);
    }

    #[tokio::test]
    async fn test_recv_spans_multiple_partial_reads() {
        // Tiny duplex buffer forces the send loop and the recv loop to run
        // across several partial transfers.
        let (a, b) = tokio::io::duplex(8);
        let mut a = ByteChannel::from_stream(a);
        let mut b = ByteChannel::from_stream(b);

        let payload: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();
        let expect = payload.clone();

        let writer = tokio::spawn(async move {
            a.send(&payload).await.unwrap();
            a
        });

        let mut buf = vec![0u8; 200];
        b.recv(&mut buf).await.unwrap();
        assert_eq!(buf, expect);

        let a = writer.await.unwrap();
        assert_eq!(a.send_offset(), 200);
        assert_eq!(b.recv_offset(), 200);
    }

    #[tokio::test]
    async fn test_send_flushes_through_buffered_writer() {
        let (a, b) = tokio::io::duplex(256);
        let (read_a, write_a) = tokio::io::split(a);
        let mut tx = ByteChannel::from_parts(read_a, tokio::io::BufWriter::new(write_a));
        let mut rx = ByteChannel::from_stream(b);

        // Bytes must reach the peer as soon as send returns, even when the
        // writer buffers internally.
        tx.send(b"buffered hello").await.unwrap();
        drop(tx);

        let mut buf = [0u8; 14];
        rx.recv(&mut buf).await.unwrap();
        assert_eq!(&buf, b"buffered hello");
    }

    #[tokio::test]
    async fn test_recv_on_closed_peer_is_transport_error() {
        let (a, mut b) = loopback();
        drop(a);

        let mut buf = [0u8; 4];
        let err = b.recv(&mut buf).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)));
    }

    #[tokio::test]
    async fn test_close_shuts_down_write_side() {
        let (mut a, mut b) = loopback();
        a.send(b"bye").await.unwrap();
        a.close().await.unwrap();

        let mut buf = [0u8; 3];
        b.recv(&mut buf).await.unwrap();
        assert_eq!(&buf, b"bye");

        // Past the shutdown point the stream reports closure, not garbage.
        let err = b.recv(&mut buf).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)));
    }
}
