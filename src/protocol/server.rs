//! Server role of the handshake.
//!
//! Mirror image of the client: receive `ClientBeginConnect` (tag-checked),
//! send `ServerCompleteConnect`, send `Disconnect`. One session per
//! endpoint; serving another client means constructing a fresh channel and
//! a fresh server. Failures are logged and propagated, never retried.

use crate::config::PROTOCOL_VERSION;
use crate::error::Result;
use crate::protocol::endpoint::Endpoint;
use crate::protocol::packet::{
    mismatch, Packet, CMD_CLIENT_BEGIN_CONNECT, DEFAULT_DISCONNECT_REASON,
};
use crate::transport::ByteChannel;
use tracing::{error, info, instrument};

/// What the server observed over a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReport {
    /// Identity string the client announced.
    pub client_id: String,
    /// Program string the client announced.
    pub client_class: String,
}

/// Server endpoint of a session.
pub struct Server {
    endpoint: Endpoint,
    server_id: String,
    server_class: String,
}

impl Server {
    /// Bind the server identity to an exclusively owned channel.
    pub fn new(
        server_id: impl Into<String>,
        server_class: impl Into<String>,
        channel: ByteChannel,
    ) -> Self {
        Self {
            endpoint: Endpoint::new(channel),
            server_id: server_id.into(),
            server_class: server_class.into(),
        }
    }

    /// Drive the full server state machine to completion.
    #[instrument(skip(self), fields(server_id = %self.server_id, server_class = %self.server_class))]
    pub async fn run(self) -> Result<ServerReport> {
        match self.session().await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(error = %e, "server session failed");
                Err(e)
            }
        }
    }

    async fn session(mut self) -> Result<ServerReport> {
        info!("waiting for client");
        let (client_id, client_class) = match self
            .endpoint
            .recv_expected(CMD_CLIENT_BEGIN_CONNECT)
            .await?
        {
            Packet::ClientBeginConnect {
                client_id,
                client_class,
                ..
            } => (client_id, client_class),
            other => return Err(mismatch(CMD_CLIENT_BEGIN_CONNECT, &other)),
        };
        info!(%client_id, %client_class, "client connected");

        self.endpoint
            .send_packet(&Packet::ServerCompleteConnect {
                protocol_version: PROTOCOL_VERSION,
                server_id: self.server_id.clone(),
                server_class: self.server_class.clone(),
            })
            .await?;

        self.endpoint
            .send_packet(&Packet::Disconnect {
                reason: DEFAULT_DISCONNECT_REASON.to_string(),
            })
            .await?;
        info!(%client_id, "session complete, disconnected");

        self.endpoint.close().await?;

        Ok(ServerReport {
            client_id,
            client_class,
        })
    }
}
