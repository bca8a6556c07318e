//! Scripted loopback room host for integration tests.
//!
//! It accepts real TCP connections and speaks the room protocol, but owns no
//! simulation: tests decide exactly which replication frames go out and read
//! back whatever the client sends.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Context;
use room_shared::{
    config::ClientConfig,
    net::{
        ClientMsg, InputSnapshot, MessageType, PlayerState, ReliableConn, ReliableListener,
        ServerMsg, SessionId, PROTOCOL_VERSION,
    },
};
use tracing::info;

/// Listens on an ephemeral localhost port.
pub struct ScriptedRoomHost {
    listener: ReliableListener,
}

impl ScriptedRoomHost {
    /// Binds to `127.0.0.1:0` and returns a client config pointing at it.
    pub async fn bind_ephemeral() -> anyhow::Result<(Self, ClientConfig)> {
        let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let listener = ReliableListener::bind(bind).await?;
        let cfg = ClientConfig {
            server_addr: listener.local_addr()?.to_string(),
            ..Default::default()
        };
        Ok((Self { listener }, cfg))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts one client and completes its join handshake. `initial` players
    /// are written right behind the `Joined` reply.
    pub async fn accept_join(
        &self,
        session_id: &str,
        initial: &[(&str, PlayerState)],
    ) -> anyhow::Result<JoinedClient> {
        let (mut conn, peer) = self.listener.accept().await?;
        let room = expect_join(&mut conn).await?;

        let session_id = SessionId::new(session_id);
        conn.send(&ServerMsg::Joined {
            session_id: session_id.clone(),
            room: room.clone(),
        })
        .await?;
        for (id, state) in initial {
            conn.send(&ServerMsg::PlayerAdded {
                session_id: SessionId::new(*id),
                state: *state,
            })
            .await?;
        }

        info!(%peer, %session_id, room = %room, "Client joined scripted room");
        Ok(JoinedClient {
            conn,
            session_id,
            room,
        })
    }

    /// Accepts one client and refuses its join.
    pub async fn accept_reject(&self, reason: &str) -> anyhow::Result<()> {
        let (mut conn, _peer) = self.listener.accept().await?;
        expect_join(&mut conn).await?;
        conn.send(&ServerMsg::JoinRejected {
            reason: reason.to_string(),
        })
        .await
    }
}

async fn expect_join(conn: &mut ReliableConn) -> anyhow::Result<String> {
    match conn.recv::<ClientMsg>().await? {
        ClientMsg::JoinOrCreate { protocol, room } if protocol == PROTOCOL_VERSION => Ok(room),
        other => anyhow::bail!("expected JoinOrCreate, got {other:?}"),
    }
}

/// The host side of one joined client.
pub struct JoinedClient {
    conn: ReliableConn,
    pub session_id: SessionId,
    pub room: String,
}

impl JoinedClient {
    pub async fn send(&mut self, msg: &ServerMsg) -> anyhow::Result<()> {
        self.conn.send(msg).await
    }

    pub async fn add(&mut self, id: &str, x: f32, y: f32) -> anyhow::Result<()> {
        self.send(&ServerMsg::PlayerAdded {
            session_id: SessionId::new(id),
            state: PlayerState { x, y },
        })
        .await
    }

    pub async fn change(&mut self, id: &str, x: f32, y: f32) -> anyhow::Result<()> {
        self.send(&ServerMsg::PlayerChanged {
            session_id: SessionId::new(id),
            state: PlayerState { x, y },
        })
        .await
    }

    pub async fn remove(&mut self, id: &str) -> anyhow::Result<()> {
        self.send(&ServerMsg::PlayerRemoved {
            session_id: SessionId::new(id),
        })
        .await
    }

    /// Reads the next application message, which must be an input update.
    pub async fn recv_input(&mut self) -> anyhow::Result<InputSnapshot> {
        match self.conn.recv::<ClientMsg>().await? {
            ClientMsg::Message(msg) if msg.kind == MessageType::Input.code() => {
                serde_json::from_value(msg.payload).context("decode input payload")
            }
            other => anyhow::bail!("expected input message, got {other:?}"),
        }
    }
}
