//! # Packet Framing
//!
//! Self-describing frame format and the typed packets it carries.
//!
//! Every frame on the wire is laid out as:
//!
//! ```text
//! u64 length      total frame bytes, including this 20-byte fixed overhead
//! u32 command id  which packet variant the payload encodes
//! u32 sentinel    random, non-zero, fresh per send
//! ... payload     variant-specific, length - 20 bytes
//! u32 sentinel    must equal the leading sentinel
//! ```
//!
//! The length plus the repeated sentinel let either side detect a variant
//! whose encode and decode disagree about payload size immediately, instead
//! of silently misreading every subsequent frame. That is the protocol's
//! sole integrity mechanism; it is an alignment check, not a cryptographic
//! one.

use crate::core::wire::Wire;
use crate::error::{constants, ProtocolError, Result};
use crate::transport::ByteChannel;
use rand::Rng;

/// Fixed per-frame overhead: length, command id, and both sentinels.
pub const FRAME_OVERHEAD: u64 = 20;

/// Wildcard command id. Matches any packet in a tag-checked receive and is
/// never sent.
pub const CMD_ANY: u32 = 0;
/// Fatal error report. No further traffic is possible after this packet.
pub const CMD_ERROR: u32 = 1;
/// First packet of the handshake, client to server.
pub const CMD_CLIENT_BEGIN_CONNECT: u32 = 2;
/// Second packet of the handshake, server to client.
pub const CMD_SERVER_COMPLETE_CONNECT: u32 = 3;
/// Graceful teardown from either side. Ends the session.
pub const CMD_DISCONNECT: u32 = 4;

/// Stock reason the server sends when it tears the session down.
pub const DEFAULT_DISCONNECT_REASON: &str = "session complete";

/// A logical, typed message exchanged between endpoints.
///
/// The enum is closed: every valid command id is known at compile time and
/// the receive path materializes exactly one variant per id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// The peer hit a fatal condition; the connection is effectively shut.
    Error {
        /// Human-readable description of what went wrong.
        message: String,
    },
    /// Client announces itself and asks to establish a session.
    ClientBeginConnect {
        /// Protocol level the client speaks. Held in memory but not
        /// persisted in this packet's payload.
        protocol_version: u32,
        /// Identifies the person driving the client.
        client_id: String,
        /// Identifies the client program.
        client_class: String,
    },
    /// Server accepts the session and announces itself.
    ServerCompleteConnect {
        /// Protocol level in use; carried on the wire, never compared.
        protocol_version: u32,
        /// Identifies the server instance.
        server_id: String,
        /// Identifies the server program.
        server_class: String,
    },
    /// Graceful teardown; no traffic may follow.
    Disconnect {
        /// Why the session ended.
        reason: String,
    },
}

impl Packet {
    /// The command id this variant travels under.
    pub fn command_id(&self) -> u32 {
        match self {
            Packet::Error { .. } => CMD_ERROR,
            Packet::ClientBeginConnect { .. } => CMD_CLIENT_BEGIN_CONNECT,
            Packet::ServerCompleteConnect { .. } => CMD_SERVER_COMPLETE_CONNECT,
            Packet::Disconnect { .. } => CMD_DISCONNECT,
        }
    }

    /// Human-readable command name, for diagnostics and mismatch errors.
    pub fn command_name(&self) -> &'static str {
        command_name_of(self.command_id())
    }

    /// Declared payload size in bytes. Must agree exactly with what
    /// `encode_payload` writes; both send and recv verify the agreement.
    pub fn payload_size(&self) -> u64 {
        match self {
            Packet::Error { message } => message.wire_size(),
            Packet::ClientBeginConnect {
                client_id,
                client_class,
                ..
            } => client_id.wire_size() + client_class.wire_size(),
            Packet::ServerCompleteConnect {
                protocol_version,
                server_id,
                server_class,
            } => protocol_version.wire_size() + server_id.wire_size() + server_class.wire_size(),
            Packet::Disconnect { reason } => reason.wire_size(),
        }
    }

    /// Total frame size: payload plus the fixed overhead.
    pub fn frame_size(&self) -> u64 {
        self.payload_size() + FRAME_OVERHEAD
    }

    async fn encode_payload(&self, channel: &mut ByteChannel) -> Result<()> {
        match self {
            Packet::Error { message } => message.encode(channel).await,
            Packet::ClientBeginConnect {
                client_id,
                client_class,
                ..
            } => {
                client_id.encode(channel).await?;
                client_class.encode(channel).await
            }
            Packet::ServerCompleteConnect {
                protocol_version,
                server_id,
                server_class,
            } => {
                protocol_version.encode(channel).await?;
                server_id.encode(channel).await?;
                server_class.encode(channel).await
            }
            Packet::Disconnect { reason } => reason.encode(channel).await,
        }
    }

    /// Materialize the variant a command id names and decode its payload.
    /// This is the fixed factory table of the protocol.
    async fn decode_payload(command: u32, channel: &mut ByteChannel) -> Result<Self> {
        match command {
            CMD_ERROR => Ok(Packet::Error {
                message: String::decode(channel).await?,
            }),
            CMD_CLIENT_BEGIN_CONNECT => Ok(Packet::ClientBeginConnect {
                protocol_version: crate::config::PROTOCOL_VERSION,
                client_id: String::decode(channel).await?,
                client_class: String::decode(channel).await?,
            }),
            CMD_SERVER_COMPLETE_CONNECT => Ok(Packet::ServerCompleteConnect {
                protocol_version: u32::decode(channel).await?,
                server_id: String::decode(channel).await?,
                server_class: String::decode(channel).await?,
            }),
            CMD_DISCONNECT => Ok(Packet::Disconnect {
                reason: String::decode(channel).await?,
            }),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }

    /// Write one complete, self-consistent frame.
    pub async fn send(&self, channel: &mut ByteChannel) -> Result<()> {
        let begin = channel.send_offset();
        let length = self.frame_size();
        debug_assert!(length >= FRAME_OVERHEAD);

        let sentinel = fresh_sentinel();

        length.encode(channel).await?;
        self.command_id().encode(channel).await?;
        sentinel.encode(channel).await?;
        self.encode_payload(channel).await?;
        sentinel.encode(channel).await?;

        // Post-condition: a variant whose declared size disagrees with the
        // bytes it wrote is a defect in the variant, not in the transport.
        let sent = channel.send_offset() - begin;
        if sent != length {
            return Err(ProtocolError::FrameSizeDefect {
                command: self.command_name().to_string(),
                declared: length,
                actual: sent,
            });
        }
        Ok(())
    }

    /// Read one complete frame and return the packet it carried.
    pub async fn recv(channel: &mut ByteChannel) -> Result<Packet> {
        let begin = channel.recv_offset();

        let length = u64::decode(channel).await?;
        let command = u32::decode(channel).await?;
        let sentinel = u32::decode(channel).await?;

        if length < FRAME_OVERHEAD {
            return Err(ProtocolError::Violation(
                constants::ERR_FRAME_TOO_SHORT.into(),
            ));
        }

        let packet = Packet::decode_payload(command, channel).await?;

        let trailer = u32::decode(channel).await?;
        if trailer != sentinel {
            return Err(ProtocolError::Violation(
                constants::ERR_SENTINEL_MISMATCH.into(),
            ));
        }

        let taken = channel.recv_offset() - begin;
        if taken != length {
            return Err(ProtocolError::Violation(format!(
                "frame declared {length} bytes but {} decoded {taken}",
                packet.command_name()
            )));
        }

        Ok(packet)
    }

    /// Read one frame, additionally enforcing the command tag.
    /// [`CMD_ANY`] accepts every packet.
    pub async fn recv_expected(channel: &mut ByteChannel, expected: u32) -> Result<Packet> {
        let packet = Packet::recv(channel).await?;
        if expected != CMD_ANY && packet.command_id() != expected {
            return Err(mismatch(expected, &packet));
        }
        Ok(packet)
    }
}

/// The one place a tag mismatch becomes an error; both the tag-checked
/// receive and the state machines route through it.
pub(crate) fn mismatch(expected: u32, actual: &Packet) -> ProtocolError {
    ProtocolError::TypeMismatch {
        expected: command_name_of(expected).to_string(),
        actual: actual.command_name().to_string(),
    }
}

/// Name of a command id, for diagnostics.
pub fn command_name_of(command: u32) -> &'static str {
    match command {
        CMD_ANY => "Any",
        CMD_ERROR => "Error",
        CMD_CLIENT_BEGIN_CONNECT => "ClientBeginConnect",
        CMD_SERVER_COMPLETE_CONNECT => "ServerCompleteConnect",
        CMD_DISCONNECT => "Disconnect",
        _ => "Unknown",
    }
}

/// Random non-zero sentinel, fresh per frame.
fn fresh_sentinel() -> u32 {
    let mut rng = rand::rng();
    loop {
        let sentinel: u32 = rng.random();
        if sentinel != 0 {
            return sentinel;
        }
    }
}
