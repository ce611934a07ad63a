//! File-descriptor transport: one read-only source and one write-only
//! destination, from named files (typically FIFOs) or the process's
//! standard input/output when the path is the `-` marker.

use crate::config::STDIO_MARKER;
use crate::error::{ProtocolError, Result};
use crate::transport::channel::ByteChannel;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Open a file-backed channel.
///
/// Both descriptors are opened eagerly; an unopenable path fails here and
/// no channel is returned.
pub async fn open(source: &str, dest: &str) -> Result<ByteChannel> {
    // Destination first, mirroring the send-side being the first thing a
    // client uses.
    let writer: Box<dyn AsyncWrite + Send + Unpin> = if dest == STDIO_MARKER {
        Box::new(tokio::io::stdout())
    } else {
        debug!(path = dest, "opening channel destination for writing");
        let file = OpenOptions::new().write(true).open(dest).await.map_err(|e| {
            ProtocolError::Transport(format!("couldn't open '{dest}' for writing: {e}"))
        })?;
        Box::new(file)
    };

    let reader: Box<dyn AsyncRead + Send + Unpin> = if source == STDIO_MARKER {
        Box::new(tokio::io::stdin())
    } else {
        debug!(path = source, "opening channel source for reading");
        let file = File::open(source).await.map_err(|e| {
            ProtocolError::Transport(format!("couldn't open '{source}' for reading: {e}"))
        })?;
        Box::new(file)
    };

    Ok(ByteChannel::from_parts(reader, writer))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_through_real_files() {
        let dir = tempfile::tempdir().unwrap();
        let inbound = dir.path().join("inbound.bin");
        let outbound = dir.path().join("outbound.bin");

        std::fs::write(&inbound, b"from the far side").unwrap();
        std::fs::write(&outbound, b"").unwrap();

        let mut channel = open(
            inbound.to_str().unwrap(),
            outbound.to_str().unwrap(),
        )
        .await
        .unwrap();

        let mut buf = [0u8; 17];
        channel.recv(&mut buf).await.unwrap();
        assert_eq!(&buf, b"from the far side");

        channel.send(b"to the far side").await.unwrap();
        channel.close().await.unwrap();

        assert_eq!(std::fs::read(&outbound).unwrap(), b"to the far side");
    }

    #[tokio::test]
    async fn test_missing_source_fails_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.bin");
        std::fs::write(&present, b"").unwrap();

        let missing = dir.path().join("no-such-file.bin");
        let err = open(missing.to_str().unwrap(), present.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)));
    }

    #[tokio::test]
    async fn test_missing_dest_fails_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.bin");
        std::fs::write(&present, b"").unwrap();

        // Write side does not create files; the path must already exist.
        let missing = dir.path().join("no-such-file.bin");
        let err = open(present.to_str().unwrap(), missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)));
    }
}
