//! TCP room transport.
//!
//! Speaks the framed JSON room protocol: one `JoinOrCreate` handshake, then a
//! reader task turning server frames into [`StateChange`]s and a writer task
//! draining outbound messages. Neither task retries; when the socket closes the
//! room just stops producing changes.

use std::net::SocketAddr;

use anyhow::Context;
use async_trait::async_trait;
use room_shared::{
    config::ClientConfig,
    net::{
        ClientMsg, FrameReader, FrameWriter, OutboundMessage, ReliableConn, ServerMsg,
        PROTOCOL_VERSION,
    },
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::room::{ChannelRoom, RoomTransport, StateChange};

/// Joins rooms on a single room server.
#[derive(Debug, Clone)]
pub struct TcpRoomTransport {
    server_addr: SocketAddr,
}

impl TcpRoomTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn from_config(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let server_addr = cfg.server_addr.parse().context("parse server_addr")?;
        Ok(Self::new(server_addr))
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }
}

#[async_trait]
impl RoomTransport for TcpRoomTransport {
    type Room = ChannelRoom;

    async fn join_or_create(&self, room_name: &str) -> anyhow::Result<ChannelRoom> {
        info!(server = %self.server_addr, room = %room_name, "Joining room");

        let mut conn = ReliableConn::connect(self.server_addr).await?;
        conn.send(&ClientMsg::JoinOrCreate {
            protocol: PROTOCOL_VERSION,
            room: room_name.to_string(),
        })
        .await?;

        let (session_id, room) = match conn.recv::<ServerMsg>().await? {
            ServerMsg::Joined { session_id, room } => (session_id, room),
            ServerMsg::JoinRejected { reason } => anyhow::bail!("join rejected: {reason}"),
            other => anyhow::bail!("expected Joined, got {other:?}"),
        };

        // The change queue exists before the first replication frame is read,
        // so no add can slip past.
        let (channel_room, feed) = ChannelRoom::pair(session_id, room);
        let (changes, outbound) = feed.into_parts();
        let (reader, writer) = conn.into_split();
        tokio::spawn(read_changes(reader, changes));
        tokio::spawn(write_messages(writer, outbound));

        Ok(channel_room)
    }
}

async fn read_changes(mut reader: FrameReader, changes: UnboundedSender<StateChange>) {
    loop {
        let msg = match reader.recv::<ServerMsg>().await {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Room connection closed");
                return;
            }
        };
        match StateChange::from_server(msg) {
            Some(change) => {
                if changes.send(change).is_err() {
                    debug!("Room dropped, stopping reader");
                    return;
                }
            }
            None => debug!("Ignoring handshake message after join"),
        }
    }
}

async fn write_messages(mut writer: FrameWriter, mut outbound: UnboundedReceiver<OutboundMessage>) {
    while let Some(msg) = outbound.recv().await {
        if let Err(e) = writer.send(&ClientMsg::Message(msg)).await {
            warn!(error = %e, "Failed to send room message");
            return;
        }
    }
    debug!("Room dropped, stopping writer");
}
