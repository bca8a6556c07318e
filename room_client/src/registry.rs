//! Remote entity registry.
//!
//! Maps each remote session to the visual entity that represents it locally.
//! Membership changes only through [`EntityRegistry::on_session_added`] and
//! [`EntityRegistry::on_session_removed`], so a session is registered exactly
//! while its sprite exists in the scene host.

use std::collections::HashMap;

use room_shared::{
    math::Vec2,
    net::{PlayerState, SessionId},
};
use tracing::{debug, info, warn};

use crate::host::{SceneHost, SpriteId};

/// Local representation of one remote player.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntity {
    pub sprite: SpriteId,
    /// Last position pushed by the room. Only change notifications write it.
    pub authoritative: Vec2,
    /// Position currently shown. Only the interpolation loop moves it.
    pub displayed: Vec2,
}

impl RemoteEntity {
    fn new(sprite: SpriteId, position: Vec2) -> Self {
        Self {
            sprite,
            authoritative: position,
            displayed: position,
        }
    }
}

/// Session id -> remote entity.
#[derive(Debug)]
pub struct EntityRegistry {
    sprite_key: String,
    entities: HashMap<SessionId, RemoteEntity>,
}

impl EntityRegistry {
    pub fn new(sprite_key: impl Into<String>) -> Self {
        Self {
            sprite_key: sprite_key.into(),
            entities: HashMap::new(),
        }
    }

    /// Creates the sprite for a newly added session.
    ///
    /// A second add for a session that is still registered replaces it: the
    /// stale sprite is destroyed before the new one is created.
    pub fn on_session_added<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        session_id: SessionId,
        initial: PlayerState,
    ) {
        let mut position = Vec2::new(initial.x, initial.y);
        if !position.is_finite() {
            warn!(%session_id, x = initial.x, y = initial.y, "Non-finite spawn position, using origin");
            position = Vec2::ZERO;
        }

        if let Some(stale) = self.entities.remove(&session_id) {
            warn!(%session_id, "Duplicate add for registered session, replacing entity");
            host.destroy_sprite(stale.sprite);
        }

        let sprite = host.create_sprite(position, &self.sprite_key);
        info!(%session_id, x = position.x, y = position.y, "A player has joined");
        self.entities
            .insert(session_id, RemoteEntity::new(sprite, position));
    }

    /// Records a new authoritative position. The displayed position is left
    /// for the interpolation loop.
    ///
    /// Returns false when nothing was updated.
    pub fn on_session_changed(&mut self, session_id: &SessionId, state: PlayerState) -> bool {
        let Some(entity) = self.entities.get_mut(session_id) else {
            debug!(%session_id, "Change for unregistered session");
            return false;
        };

        let target = Vec2::new(state.x, state.y);
        if !target.is_finite() {
            warn!(%session_id, x = state.x, y = state.y, "Ignoring non-finite position");
            return false;
        }

        entity.authoritative = target;
        true
    }

    /// Destroys the sprite of a removed session. Unknown sessions are a no-op.
    ///
    /// Returns true if an entity was removed.
    pub fn on_session_removed<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        session_id: &SessionId,
    ) -> bool {
        match self.entities.remove(session_id) {
            Some(entity) => {
                host.destroy_sprite(entity.sprite);
                info!(%session_id, "A player has left");
                true
            }
            None => {
                debug!(%session_id, "Remove for unregistered session");
                false
            }
        }
    }

    /// Removes every entry, destroying its sprite. Returns how many were removed.
    pub fn clear<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let removed = self.entities.len();
        for (_, entity) in self.entities.drain() {
            host.destroy_sprite(entity.sprite);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.entities.contains_key(session_id)
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&RemoteEntity> {
        self.entities.get(session_id)
    }

    /// Registered session ids in sorted order.
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.entities.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SessionId, &RemoteEntity)> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&SessionId, &mut RemoteEntity)> {
        self.entities.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::host::HeadlessScene;

    fn state(x: f32, y: f32) -> PlayerState {
        PlayerState { x, y }
    }

    #[test]
    fn add_seeds_both_positions() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "abc".into(), state(100.0, 100.0));

        let e = reg.get(&"abc".into()).unwrap();
        assert_eq!(e.authoritative, Vec2::new(100.0, 100.0));
        assert_eq!(e.displayed, e.authoritative);
        assert_eq!(scene.get(e.sprite).unwrap().key, "ship_0001");
    }

    #[test]
    fn change_only_touches_authoritative() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "abc".into(), state(100.0, 100.0));

        assert!(reg.on_session_changed(&"abc".into(), state(110.0, 100.0)));
        let e = reg.get(&"abc".into()).unwrap();
        assert_eq!(e.authoritative, Vec2::new(110.0, 100.0));
        assert_eq!(e.displayed, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn change_for_unknown_session_is_ignored() {
        let mut reg = EntityRegistry::new("ship_0001");
        assert!(!reg.on_session_changed(&"ghost".into(), state(1.0, 1.0)));
        assert!(reg.is_empty());
    }

    #[test]
    fn non_finite_change_keeps_previous_target() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "abc".into(), state(5.0, 5.0));

        assert!(!reg.on_session_changed(&"abc".into(), state(f32::NAN, 1.0)));
        assert_eq!(
            reg.get(&"abc".into()).unwrap().authoritative,
            Vec2::new(5.0, 5.0)
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "abc".into(), state(0.0, 0.0));

        assert!(reg.on_session_removed(&mut scene, &"abc".into()));
        assert!(!reg.on_session_removed(&mut scene, &"abc".into()));
        assert!(reg.is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn clear_destroys_every_sprite() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "a".into(), state(0.0, 0.0));
        reg.on_session_added(&mut scene, "b".into(), state(1.0, 1.0));

        assert_eq!(reg.clear(&mut scene), 2);
        assert!(reg.is_empty());
        assert!(scene.is_empty());
        assert_eq!(reg.clear(&mut scene), 0);
    }

    #[test]
    fn duplicate_add_replaces_entity() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "abc".into(), state(1.0, 1.0));
        let first = reg.get(&"abc".into()).unwrap().sprite;

        reg.on_session_added(&mut scene, "abc".into(), state(9.0, 9.0));
        let e = reg.get(&"abc".into()).unwrap();

        assert_eq!(reg.len(), 1);
        assert_eq!(scene.len(), 1);
        assert!(scene.get(first).is_none());
        assert_eq!(e.displayed, Vec2::new(9.0, 9.0));
    }

    #[test]
    fn non_finite_spawn_falls_back_to_origin() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "abc".into(), state(f32::INFINITY, 3.0));
        assert_eq!(reg.get(&"abc".into()).unwrap().displayed, Vec2::ZERO);
    }

    #[test]
    fn membership_tracks_add_remove_sequence() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        let mut expected = BTreeSet::new();

        // (add?, id)
        let script = [
            (true, "a"),
            (true, "b"),
            (false, "a"),
            (false, "zzz"),
            (true, "c"),
            (true, "a"),
            (false, "b"),
            (false, "b"),
            (true, "d"),
            (false, "c"),
        ];
        for (add, id) in script {
            if add {
                reg.on_session_added(&mut scene, id.into(), state(0.0, 0.0));
                expected.insert(SessionId::from(id));
            } else {
                reg.on_session_removed(&mut scene, &id.into());
                expected.remove(&SessionId::from(id));
            }
            let got: BTreeSet<_> = reg.session_ids().into_iter().collect();
            assert_eq!(got, expected);
            assert_eq!(scene.len(), expected.len());
        }
    }
}
