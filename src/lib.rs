//! # benchwire
//!
//! Session-oriented binary protocol core for paired benchmarking processes.
//!
//! Two processes, connected over a file-descriptor pair or a TCP socket,
//! exchange strongly typed, length-delimited, sentinel-guarded messages
//! through four layers:
//!
//! - [`transport::ByteChannel`]: duplex, ordered, reliable byte stream
//!   with monotonic per-direction cursors
//! - [`core::wire`]: typed big-endian encode/decode rules over a channel
//! - [`protocol::packet`]: self-describing frames and the closed set of
//!   packet variants they carry
//! - [`protocol::client`] / [`protocol::server`]: the two roles of the
//!   connect/disconnect handshake
//!
//! All session operations are sequential and block until complete or
//! failed; nothing is retried, and any protocol or transport failure is
//! fatal to the session.
//!
//! ## Example
//! ```no_run
//! use benchwire::config::ChannelSpec;
//! use benchwire::protocol::Client;
//!
//! # async fn run() -> benchwire::error::Result<()> {
//! let spec = ChannelSpec::parse(&["tcp-client", "localhost", "4000"])?;
//! let channel = benchwire::transport::open(&spec).await?;
//! let report = Client::new("alice", "bench", channel).run().await?;
//! println!("served by {} ({})", report.server_id, report.server_class);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;

pub use error::{ProtocolError, Result};
