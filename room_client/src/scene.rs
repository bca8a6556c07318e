//! Game scene.
//!
//! The scene host drives two hooks: [`GameScene::create`] once at startup and
//! [`GameScene::update`] once per frame. Everything that only exists while
//! joined to a room (the room itself, the input snapshot, the entity
//! registry) lives in a [`RoomSession`]; without one, `update` does nothing.

use room_shared::{
    config::ClientConfig,
    net::{InputSnapshot, OutboundMessage},
};
use tracing::{debug, error, info, trace, warn};

use crate::{
    host::SceneHost,
    input::{sample_input, InputDevice},
    interp::Interpolator,
    registry::EntityRegistry,
    room::{Room, RoomTransport, StateChange},
};

/// Per-connection state, created when a join succeeds.
pub struct RoomSession<R: Room> {
    room: R,
    input: InputSnapshot,
    registry: EntityRegistry,
    /// Set after the first failed input send; later failures log at debug.
    send_failing: bool,
}

impl<R: Room> RoomSession<R> {
    pub fn new(room: R, sprite_key: &str) -> Self {
        Self {
            room,
            input: InputSnapshot::default(),
            registry: EntityRegistry::new(sprite_key),
            send_failing: false,
        }
    }

    pub fn room(&self) -> &R {
        &self.room
    }

    /// The snapshot sent on the most recent frame.
    pub fn input(&self) -> &InputSnapshot {
        &self.input
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// True while input sends keep failing.
    pub fn is_send_failing(&self) -> bool {
        self.send_failing
    }

    /// Routes one room notification to the registry.
    pub fn apply<H: SceneHost + ?Sized>(&mut self, host: &mut H, change: StateChange) {
        match change {
            StateChange::Added { session_id, state } => {
                self.registry.on_session_added(host, session_id, state);
            }
            StateChange::Changed { session_id, state } => {
                self.registry.on_session_changed(&session_id, state);
            }
            StateChange::Removed { session_id } => {
                self.registry.on_session_removed(host, &session_id);
            }
        }
    }

    /// Applies every notification queued since the last frame, in order.
    pub fn pump_changes<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let mut applied = 0;
        while let Some(change) = self.room.poll_change() {
            self.apply(host, change);
            applied += 1;
        }
        applied
    }

    /// Samples the device into the session snapshot and sends it as an input
    /// message. Failures are logged and dropped.
    pub fn send_input<D: InputDevice + ?Sized>(&mut self, device: &D) {
        sample_input(device, &mut self.input);
        let result = OutboundMessage::input(&self.input).and_then(|msg| self.room.send(msg));
        match result {
            Ok(()) => self.send_failing = false,
            Err(e) if self.send_failing => debug!(error = %e, "Failed to send input"),
            Err(e) => {
                warn!(error = %e, "Failed to send input");
                self.send_failing = true;
            }
        }
    }

    /// Destroys every entity this session created.
    pub fn teardown<H: SceneHost + ?Sized>(mut self, host: &mut H) {
        let removed = self.registry.clear(host);
        info!(session_id = %self.room.session_id(), removed, "Room session torn down");
    }
}

/// Frame-driven client scene.
pub struct GameScene<R: Room, H: SceneHost, D: InputDevice> {
    sprite_key: String,
    interpolator: Interpolator,
    host: H,
    input_device: D,
    session: Option<RoomSession<R>>,
}

impl<R: Room, H: SceneHost, D: InputDevice> GameScene<R, H, D> {
    pub fn new(cfg: &ClientConfig, host: H, input_device: D) -> Self {
        Self {
            sprite_key: cfg.sprite_key.clone(),
            interpolator: Interpolator::from_config(cfg),
            host,
            input_device,
            session: None,
        }
    }

    /// Joins the configured room. A failed join is logged and leaves the
    /// scene idle for good.
    pub async fn create<T>(&mut self, transport: &T, room_name: &str)
    where
        T: RoomTransport<Room = R> + ?Sized,
    {
        let result = transport.join_or_create(room_name).await;
        self.on_join_result(result);
    }

    /// Installs the session for a completed join attempt.
    pub fn on_join_result(&mut self, result: anyhow::Result<R>) {
        match result {
            Ok(room) => {
                info!(session_id = %room.session_id(), room = %room.name(), "Joined successfully");
                if let Some(old) = self.session.take() {
                    warn!("Replacing existing room session");
                    old.teardown(&mut self.host);
                }
                self.session = Some(RoomSession::new(room, &self.sprite_key));
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to join room");
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// One frame: apply pending room changes, send input, smooth positions.
    ///
    /// `time_ms` is the host clock and only used for tracing; `delta_ms` only
    /// matters for time-scaled blending.
    pub fn update(&mut self, time_ms: f64, delta_ms: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let applied = session.pump_changes(&mut self.host);
        if applied > 0 {
            debug!(applied, players = session.registry.len(), "Applied room changes");
        }

        session.send_input(&self.input_device);

        self.interpolator.step_all(&mut session.registry, delta_ms);
        for (_, entity) in session.registry.iter() {
            self.host.move_sprite(entity.sprite, entity.displayed);
        }
        trace!(time_ms, delta_ms, "Frame");
    }

    pub fn session(&self) -> Option<&RoomSession<R>> {
        self.session.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn input_device_mut(&mut self) -> &mut D {
        &mut self.input_device
    }
}
