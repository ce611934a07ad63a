//! Client role of the handshake.
//!
//! The state machine is strictly linear:
//! send `ClientBeginConnect`, receive `ServerCompleteConnect` (tag-checked),
//! receive `Disconnect` (tag-checked). Any failure is fatal: it is logged
//! and propagated, and the caller is expected to end the session. There is
//! no retry and no reconnection.

use crate::config::PROTOCOL_VERSION;
use crate::error::Result;
use crate::protocol::endpoint::Endpoint;
use crate::protocol::packet::{mismatch, Packet, CMD_DISCONNECT, CMD_SERVER_COMPLETE_CONNECT};
use crate::transport::ByteChannel;
use tracing::{error, info, instrument};

/// What the client observed over a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientReport {
    /// Identity string the server announced.
    pub server_id: String,
    /// Program string the server announced.
    pub server_class: String,
    /// Reason carried by the server's Disconnect.
    pub disconnect_reason: String,
}

/// Client endpoint of a session.
pub struct Client {
    endpoint: Endpoint,
    client_id: String,
    client_class: String,
}

impl Client {
    /// Bind the client identity to an exclusively owned channel.
    pub fn new(
        client_id: impl Into<String>,
        client_class: impl Into<String>,
        channel: ByteChannel,
    ) -> Self {
        Self {
            endpoint: Endpoint::new(channel),
            client_id: client_id.into(),
            client_class: client_class.into(),
        }
    }

    /// Drive the full client state machine to completion.
    #[instrument(skip(self), fields(client_id = %self.client_id, client_class = %self.client_class))]
    pub async fn run(self) -> Result<ClientReport> {
        match self.session().await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(error = %e, "client session failed");
                Err(e)
            }
        }
    }

    async fn session(mut self) -> Result<ClientReport> {
        info!("connecting");
        self.endpoint
            .send_packet(&Packet::ClientBeginConnect {
                protocol_version: PROTOCOL_VERSION,
                client_id: self.client_id.clone(),
                client_class: self.client_class.clone(),
            })
            .await?;

        let (server_id, server_class) = match self
            .endpoint
            .recv_expected(CMD_SERVER_COMPLETE_CONNECT)
            .await?
        {
            Packet::ServerCompleteConnect {
                server_id,
                server_class,
                ..
            } => (server_id, server_class),
            other => return Err(mismatch(CMD_SERVER_COMPLETE_CONNECT, &other)),
        };
        info!(%server_id, %server_class, "connected");

        let reason = match self.endpoint.recv_expected(CMD_DISCONNECT).await? {
            Packet::Disconnect { reason } => reason,
            other => return Err(mismatch(CMD_DISCONNECT, &other)),
        };
        info!(%server_id, %reason, "disconnected by server");

        self.endpoint.close().await?;

        Ok(ClientReport {
            server_id,
            server_class,
            disconnect_reason: reason,
        })
    }
}
