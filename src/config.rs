//! # Channel Configuration
//!
//! Transport selection for a session.
//!
//! A channel is described by a token list whose first token picks the
//! transport constructor:
//!
//! - `["file", src, dst]`: read from `src`, write to `dst`; `-` means the
//!   process's standard input/output
//! - `["tcp-server", port]`: bind the port, accept exactly one connection
//! - `["tcp-client", host, port]`: resolve the host (both address
//!   families) and connect
//!
//! Parsing is eager and strict: an unknown header, wrong argument count, or
//! malformed port fails here, never at first use of the channel.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};

/// Protocol level spoken by this crate. Carried on the wire by the server's
/// connect-complete packet; not negotiated or compared by either side.
pub const PROTOCOL_VERSION: u32 = 0;

/// Marker token that selects the process's standard input/output in a
/// `file` spec.
pub const STDIO_MARKER: &str = "-";

/// A parsed, validated transport selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelSpec {
    /// One read fd and one write fd, from named files or process stdio.
    File {
        /// Path to read from, or `-` for stdin.
        source: String,
        /// Path to write to, or `-` for stdout.
        dest: String,
    },
    /// Listen on the port and accept a single inbound connection.
    TcpServer {
        /// Port to bind on all interfaces.
        port: u16,
    },
    /// Resolve and connect, trying each resolved address in turn.
    TcpClient {
        /// Host name or address literal.
        host: String,
        /// Remote port.
        port: u16,
    },
}

impl ChannelSpec {
    /// Parse a token list into a channel spec.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let Some(header) = tokens.first() else {
            return Err(ProtocolError::Spec("empty token list".into()));
        };

        match header.as_ref() {
            "file" => {
                if tokens.len() != 3 {
                    return Err(ProtocolError::Spec(
                        "'file' spec takes exactly two arguments: source and dest".into(),
                    ));
                }
                Ok(ChannelSpec::File {
                    source: tokens[1].as_ref().to_string(),
                    dest: tokens[2].as_ref().to_string(),
                })
            }
            "tcp-server" => {
                if tokens.len() != 2 {
                    return Err(ProtocolError::Spec(
                        "'tcp-server' spec takes exactly one argument: port".into(),
                    ));
                }
                Ok(ChannelSpec::TcpServer {
                    port: parse_port(tokens[1].as_ref())?,
                })
            }
            "tcp-client" => {
                if tokens.len() != 3 {
                    return Err(ProtocolError::Spec(
                        "'tcp-client' spec takes exactly two arguments: host and port".into(),
                    ));
                }
                Ok(ChannelSpec::TcpClient {
                    host: tokens[1].as_ref().to_string(),
                    port: parse_port(tokens[2].as_ref())?,
                })
            }
            other => Err(ProtocolError::Spec(format!(
                "unknown transport header '{other}'"
            ))),
        }
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.parse::<u16>()
        .map_err(|_| ProtocolError::Spec(format!("malformed port '{raw}'")))
}
