//! # Wire Codec
//!
//! Stateless typed encode/decode rules layered on a [`ByteChannel`].
//!
//! Every value round-trips exactly:
//! - fixed-width unsigned integers travel big-endian
//! - a `u64` travels as two `u32` halves, most significant first
//! - a string is a `u32` length followed by raw bytes, restricted to
//!   printable ASCII and whitespace on both encode and decode
//! - an opaque byte block (`Vec<u8>`) is a `u32` length followed by raw
//!   bytes with no content restriction
//! - a homogeneous sequence is a `u32` count followed by its elements,
//!   each encoded recursively
//!
//! A length or count that does not fit in 32 bits fails before any byte is
//! written, so a peer never sees a silently truncated value.

use crate::error::{constants, ProtocolError, Result};
use crate::transport::ByteChannel;

/// A value with a fixed wire representation.
///
/// Composite types encode by recursing through their fields, so
/// `wire_size` must agree exactly with the bytes `encode` produces; the
/// packet framer checks that agreement after every frame.
#[allow(async_fn_in_trait)]
pub trait Wire: Sized {
    /// Number of bytes this value occupies on the wire.
    fn wire_size(&self) -> u64;

    /// Write this value to the channel.
    async fn encode(&self, channel: &mut ByteChannel) -> Result<()>;

    /// Read one value of this type from the channel.
    async fn decode(channel: &mut ByteChannel) -> Result<Self>;
}

impl Wire for u32 {
    fn wire_size(&self) -> u64 {
        4
    }

    async fn encode(&self, channel: &mut ByteChannel) -> Result<()> {
        channel.send(&self.to_be_bytes()).await
    }

    async fn decode(channel: &mut ByteChannel) -> Result<Self> {
        let mut buf = [0u8; 4];
        channel.recv(&mut buf).await?;
        Ok(u32::from_be_bytes(buf))
    }
}

impl Wire for u64 {
    fn wire_size(&self) -> u64 {
        8
    }

    async fn encode(&self, channel: &mut ByteChannel) -> Result<()> {
        let hi = (*self >> 32) as u32;
        let lo = (*self & 0xFFFF_FFFF) as u32;
        hi.encode(channel).await?;
        lo.encode(channel).await
    }

    async fn decode(channel: &mut ByteChannel) -> Result<Self> {
        let hi = u32::decode(channel).await?;
        let lo = u32::decode(channel).await?;
        Ok((u64::from(hi) << 32) | u64::from(lo))
    }
}

impl Wire for String {
    fn wire_size(&self) -> u64 {
        4 + self.len() as u64
    }

    async fn encode(&self, channel: &mut ByteChannel) -> Result<()> {
        let length = fit_u32(self.len())?;
        check_text(self.as_bytes())?;
        length.encode(channel).await?;
        channel.send(self.as_bytes()).await
    }

    async fn decode(channel: &mut ByteChannel) -> Result<Self> {
        let length = u32::decode(channel).await?;
        let mut buf = vec![0u8; length as usize];
        channel.recv(&mut buf).await?;
        check_text(&buf)?;
        // Printable ASCII and whitespace are valid single-byte UTF-8.
        String::from_utf8(buf)
            .map_err(|_| ProtocolError::Violation(constants::ERR_NON_PRINTABLE.into()))
    }
}

impl Wire for Vec<u8> {
    fn wire_size(&self) -> u64 {
        4 + self.len() as u64
    }

    async fn encode(&self, channel: &mut ByteChannel) -> Result<()> {
        let length = fit_u32(self.len())?;
        length.encode(channel).await?;
        channel.send(self).await
    }

    async fn decode(channel: &mut ByteChannel) -> Result<Self> {
        let length = u32::decode(channel).await?;
        let mut buf = vec![0u8; length as usize];
        channel.recv(&mut buf).await?;
        Ok(buf)
    }
}

/// Wire size of a homogeneous sequence: a `u32` count plus its elements.
pub fn seq_wire_size<T: Wire>(items: &[T]) -> u64 {
    4 + items.iter().map(Wire::wire_size).sum::<u64>()
}

/// Encode a homogeneous sequence, preserving order.
pub async fn encode_seq<T: Wire>(channel: &mut ByteChannel, items: &[T]) -> Result<()> {
    let count = fit_u32(items.len())?;
    count.encode(channel).await?;
    for item in items {
        item.encode(channel).await?;
    }
    Ok(())
}

/// Decode a homogeneous sequence in the order it was encoded.
pub async fn decode_seq<T: Wire>(channel: &mut ByteChannel) -> Result<Vec<T>> {
    let count = u32::decode(channel).await?;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(T::decode(channel).await?);
    }
    Ok(items)
}

fn fit_u32(count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| ProtocolError::Violation(constants::ERR_OVERSIZED_COUNT.into()))
}

/// Strings on the wire carry only printable ASCII and whitespace. Enforced
/// on both encode and decode as a content-validity check, not a framing
/// check.
fn check_text(bytes: &[u8]) -> Result<()> {
    for &b in bytes {
        let printable = (0x20..=0x7E).contains(&b);
        let whitespace = matches!(b, b'\t' | b'\n' | 0x0B | 0x0C | b'\r');
        if !(printable || whitespace) {
            return Err(ProtocolError::Violation(constants::ERR_NON_PRINTABLE.into()));
        }
    }
    Ok(())
}
