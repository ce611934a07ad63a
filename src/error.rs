//! # Error Types
//!
//! Error handling for the wire protocol.
//!
//! This module defines all error variants that can occur during a session,
//! from transport-level I/O failures to frame-level protocol violations.
//!
//! ## Error Categories
//! - **Transport errors**: the underlying file descriptor or socket failed,
//!   made no progress, or could not be set up (including DNS resolution)
//! - **Protocol violations**: a frame or value on the wire is structurally
//!   invalid (bad length, sentinel mismatch, non-printable string content)
//! - **Session errors**: unknown command ids and type-checked receives that
//!   saw the wrong packet variant
//!
//! Nothing here is recoverable: a failed channel or a desynchronized stream
//! cannot be safely resumed, so every error aborts the session and
//! propagates to the caller.
//!
//! All errors implement `std::error::Error` for interoperability.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
/// Static strings are borrowed, avoiding heap allocations for common error cases.
pub mod constants {
    /// Channel-level errors
    pub const ERR_SEND_NO_PROGRESS: &str = "Transport accepted zero bytes on send";
    pub const ERR_RECV_NO_PROGRESS: &str = "Transport returned zero bytes on recv (stream closed)";

    /// Frame validation errors
    pub const ERR_FRAME_TOO_SHORT: &str = "Frame length below the 20-byte fixed overhead";
    pub const ERR_SENTINEL_MISMATCH: &str = "Trailing sentinel does not match leading sentinel";

    /// Wire codec errors
    pub const ERR_NON_PRINTABLE: &str =
        "String contains a byte that is not printable ASCII or whitespace";
    pub const ERR_OVERSIZED_COUNT: &str = "Length or element count does not fit in 32 bits";
}

/// Primary error type for all protocol operations.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    /// An I/O primitive on the underlying transport failed.
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    /// The transport made no progress or could not be constructed
    /// (socket setup, DNS resolution, unopenable path).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A send or receive cursor passed the 64-bit range. The stream cannot
    /// be trusted past this point.
    #[error("Channel offset wrapped the 64-bit range")]
    OffsetOverflow,

    /// A frame or encoded value violated the wire format.
    #[error("Protocol violation: {0}")]
    Violation(String),

    /// A received frame carried a command id with no registered variant.
    #[error("Unknown command id: {0}")]
    UnknownCommand(u32),

    /// A type-checked receive got a structurally valid but differently
    /// tagged packet.
    #[error("Expected {expected} packet, got {actual}")]
    TypeMismatch {
        /// Command name the caller asked for.
        expected: String,
        /// Command name actually decoded from the wire.
        actual: String,
    },

    /// A variant's declared payload size disagreed with the bytes it
    /// actually wrote. This is a programming defect in the variant, not a
    /// transport failure.
    #[error("Frame size defect in {command}: declared {declared} bytes, wrote {actual}")]
    FrameSizeDefect {
        /// Command name of the offending packet.
        command: String,
        /// Byte count announced in the frame header.
        declared: u64,
        /// Byte count actually transferred.
        actual: u64,
    },

    /// A transport selection spec could not be parsed.
    #[error("Invalid channel spec: {0}")]
    Spec(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
