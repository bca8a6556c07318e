//! Room abstraction.
//!
//! A joined room hands the client two streams: state changes of the room's
//! `players` collection (in arrival order) and a sink for outbound
//! application messages. Both are plain channels, so the frame loop can drain
//! changes without ever awaiting.

use async_trait::async_trait;
use room_shared::net::{OutboundMessage, PlayerState, ServerMsg, SessionId};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// One notification about the room's `players` collection.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    Added {
        session_id: SessionId,
        state: PlayerState,
    },
    Changed {
        session_id: SessionId,
        state: PlayerState,
    },
    Removed {
        session_id: SessionId,
    },
}

impl StateChange {
    /// Maps a replication message to a state change. Handshake messages map
    /// to `None`.
    pub fn from_server(msg: ServerMsg) -> Option<Self> {
        match msg {
            ServerMsg::PlayerAdded { session_id, state } => {
                Some(StateChange::Added { session_id, state })
            }
            ServerMsg::PlayerChanged { session_id, state } => {
                Some(StateChange::Changed { session_id, state })
            }
            ServerMsg::PlayerRemoved { session_id } => Some(StateChange::Removed { session_id }),
            ServerMsg::Joined { .. } | ServerMsg::JoinRejected { .. } => None,
        }
    }
}

/// A joined room.
pub trait Room {
    /// Our own session id in this room.
    fn session_id(&self) -> &SessionId;

    fn name(&self) -> &str;

    /// Queues a message for the room. Never waits for delivery.
    fn send(&mut self, msg: OutboundMessage) -> anyhow::Result<()>;

    /// Next pending state change, if any.
    fn poll_change(&mut self) -> Option<StateChange>;
}

/// Something that can join rooms.
#[async_trait]
pub trait RoomTransport {
    type Room: Room + Send;

    async fn join_or_create(&self, room_name: &str) -> anyhow::Result<Self::Room>;
}

/// A [`Room`] backed by in-process channels.
///
/// The other ends form a [`RoomFeed`], driven either by a network transport
/// or directly by tests.
#[derive(Debug)]
pub struct ChannelRoom {
    session_id: SessionId,
    name: String,
    changes: UnboundedReceiver<StateChange>,
    outbound: UnboundedSender<OutboundMessage>,
    feed_closed: bool,
}

/// The transport-facing end of a [`ChannelRoom`].
#[derive(Debug)]
pub struct RoomFeed {
    changes: UnboundedSender<StateChange>,
    outbound: UnboundedReceiver<OutboundMessage>,
}

impl ChannelRoom {
    pub fn pair(session_id: SessionId, name: impl Into<String>) -> (ChannelRoom, RoomFeed) {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        (
            ChannelRoom {
                session_id,
                name: name.into(),
                changes: changes_rx,
                outbound: outbound_tx,
                feed_closed: false,
            },
            RoomFeed {
                changes: changes_tx,
                outbound: outbound_rx,
            },
        )
    }

    /// True once the feed side has gone away and every queued change has
    /// been drained.
    pub fn is_closed(&self) -> bool {
        self.feed_closed
    }
}

impl Room for ChannelRoom {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, msg: OutboundMessage) -> anyhow::Result<()> {
        self.outbound
            .send(msg)
            .map_err(|_| anyhow::anyhow!("room connection closed"))
    }

    fn poll_change(&mut self) -> Option<StateChange> {
        match self.changes.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.feed_closed = true;
                None
            }
        }
    }
}

impl RoomFeed {
    /// Delivers a state change to the room. Returns false if the room is gone.
    pub fn push(&self, change: StateChange) -> bool {
        self.changes.send(change).is_ok()
    }

    /// Next message the room has sent, if any.
    pub fn try_recv_outbound(&mut self) -> Option<OutboundMessage> {
        self.outbound.try_recv().ok()
    }

    /// Splits into the raw channel ends for transport tasks.
    pub fn into_parts(
        self,
    ) -> (
        UnboundedSender<StateChange>,
        UnboundedReceiver<OutboundMessage>,
    ) {
        (self.changes, self.outbound)
    }
}

#[cfg(test)]
mod tests {
    use room_shared::net::InputSnapshot;

    use super::*;

    #[test]
    fn changes_arrive_in_order() {
        let (mut room, feed) = ChannelRoom::pair("me".into(), "my_room");
        feed.push(StateChange::Added {
            session_id: "a".into(),
            state: PlayerState { x: 1.0, y: 2.0 },
        });
        feed.push(StateChange::Removed {
            session_id: "a".into(),
        });

        assert!(matches!(room.poll_change(), Some(StateChange::Added { .. })));
        assert!(matches!(room.poll_change(), Some(StateChange::Removed { .. })));
        assert_eq!(room.poll_change(), None);
        assert!(!room.is_closed());

        drop(feed);
        assert_eq!(room.poll_change(), None);
        assert!(room.is_closed());
    }

    #[test]
    fn send_fails_once_feed_is_gone() {
        let (mut room, mut feed) = ChannelRoom::pair("me".into(), "my_room");
        let msg = OutboundMessage::input(&InputSnapshot::default()).unwrap();

        room.send(msg.clone()).unwrap();
        assert_eq!(feed.try_recv_outbound(), Some(msg.clone()));

        drop(feed);
        assert!(room.send(msg).is_err());
    }

    #[test]
    fn handshake_messages_are_not_state_changes() {
        let joined = ServerMsg::Joined {
            session_id: "me".into(),
            room: "my_room".into(),
        };
        assert_eq!(StateChange::from_server(joined), None);

        let removed = ServerMsg::PlayerRemoved {
            session_id: "a".into(),
        };
        assert_eq!(
            StateChange::from_server(removed),
            Some(StateChange::Removed {
                session_id: "a".into()
            })
        );
    }
}
