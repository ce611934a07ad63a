//! TCP transport: a single bidirectional socket used for both directions.
//!
//! Two construction modes: `listen_once` binds a port and serves exactly
//! one inbound connection; `connect` resolves a host/port pair (both
//! address families) and tries each resolved address in turn. Every setup
//! failure is fatal at construction time.

use crate::error::{ProtocolError, Result};
use crate::transport::channel::ByteChannel;
use tokio::net::{lookup_host, TcpListener, TcpStream};
use tracing::{info, instrument, warn};

/// Bind `port` on all interfaces, accept one connection, and wrap it.
///
/// The listening socket is dropped once the single session is accepted;
/// this endpoint serves exactly one peer.
#[instrument]
pub async fn listen_once(port: u16) -> Result<ByteChannel> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| ProtocolError::Transport(format!("couldn't bind port {port}: {e}")))?;

    info!(port, "waiting for a single inbound connection");

    let (stream, peer) = listener
        .accept()
        .await
        .map_err(|e| ProtocolError::Transport(format!("accept failed on port {port}: {e}")))?;

    info!(peer = %peer, "accepted connection");
    Ok(split_stream(stream))
}

/// Resolve `host:port` and connect, trying each resolved address in turn.
#[instrument]
pub async fn connect(host: &str, port: u16) -> Result<ByteChannel> {
    let addrs: Vec<_> = lookup_host((host, port))
        .await
        .map_err(|e| ProtocolError::Transport(format!("couldn't resolve '{host}:{port}': {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(ProtocolError::Transport(format!(
            "'{host}:{port}' resolved to no addresses"
        )));
    }

    let mut last_failure = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!(peer = %addr, "connected");
                return Ok(split_stream(stream));
            }
            Err(e) => {
                warn!(peer = %addr, error = %e, "connect attempt failed");
                last_failure = Some(e);
            }
        }
    }

    // addrs was non-empty, so at least one attempt recorded its error.
    Err(ProtocolError::Transport(format!(
        "couldn't connect to '{host}:{port}': {}",
        last_failure.map_or_else(|| "no attempt made".to_string(), |e| e.to_string())
    )))
}

fn split_stream(stream: TcpStream) -> ByteChannel {
    let (reader, writer) = stream.into_split();
    ByteChannel::from_parts(reader, writer)
}
