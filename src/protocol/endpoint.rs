//! Session endpoint: binds one exclusively owned [`ByteChannel`] to the
//! packet framer.
//!
//! Everything here is strictly sequential. One task drives the session;
//! there is no internal locking and no concurrent access.

use crate::error::Result;
use crate::protocol::packet::Packet;
use crate::transport::ByteChannel;
use tracing::debug;

/// One end of an established session.
pub struct Endpoint {
    channel: ByteChannel,
}

impl Endpoint {
    /// Take exclusive ownership of a connected channel.
    pub fn new(channel: ByteChannel) -> Self {
        Self { channel }
    }

    /// Send one packet as a complete frame.
    pub async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        debug!(command = packet.command_name(), "sending packet");
        packet.send(&mut self.channel).await
    }

    /// Receive the next packet, whatever its command.
    pub async fn recv_packet(&mut self) -> Result<Packet> {
        let packet = Packet::recv(&mut self.channel).await?;
        debug!(command = packet.command_name(), "received packet");
        Ok(packet)
    }

    /// Receive the next packet and enforce its command tag.
    /// [`CMD_ANY`](crate::protocol::packet::CMD_ANY) accepts anything.
    pub async fn recv_expected(&mut self, expected: u32) -> Result<Packet> {
        let packet = Packet::recv_expected(&mut self.channel, expected).await?;
        debug!(command = packet.command_name(), "received packet");
        Ok(packet)
    }

    /// Shut the session down, closing the owned channel.
    pub async fn close(self) -> Result<()> {
        self.channel.close().await
    }
}
