//! # Transport Layer
//!
//! Concrete byte transports and the [`ByteChannel`] abstraction over them.
//!
//! [`open`] is the single entry point: it takes a parsed
//! [`ChannelSpec`](crate::config::ChannelSpec) and returns a connected,
//! ready-to-use channel, or fails. No partially constructed or degraded
//! channel is ever returned.

pub mod channel;
pub mod file;
pub mod tcp;

pub use channel::ByteChannel;

use crate::config::ChannelSpec;
use crate::error::Result;

/// Open the transport a spec describes and wrap it in a channel.
pub async fn open(spec: &ChannelSpec) -> Result<ByteChannel> {
    match spec {
        ChannelSpec::File { source, dest } => file::open(source, dest).await,
        ChannelSpec::TcpServer { port } => tcp::listen_once(*port).await,
        ChannelSpec::TcpClient { host, port } => tcp::connect(host, *port).await,
    }
}
