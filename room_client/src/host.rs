//! Scene host abstraction.
//!
//! This crate does not depend on a rendering backend. The scene host owns the
//! visual objects; the core only creates, moves, and destroys them by id.

use std::collections::HashMap;

use room_shared::math::Vec2;
use tracing::debug;

/// Opaque handle to a visual object owned by the scene host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u64);

/// The minimal surface the core needs from a rendering host.
pub trait SceneHost {
    fn create_sprite(&mut self, position: Vec2, sprite_key: &str) -> SpriteId;
    fn move_sprite(&mut self, id: SpriteId, position: Vec2);
    fn destroy_sprite(&mut self, id: SpriteId);
}

/// A visual object tracked by [`HeadlessScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub key: String,
    pub position: Vec2,
}

/// A scene host that only records sprite state. Used by the headless client
/// binary and by tests.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    next_id: u64,
    sprites: HashMap<SpriteId, Sprite>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.get(&id)
    }

    /// Returns the number of live sprites.
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpriteId, &Sprite)> {
        self.sprites.iter().map(|(id, s)| (*id, s))
    }
}

impl SceneHost for HeadlessScene {
    fn create_sprite(&mut self, position: Vec2, sprite_key: &str) -> SpriteId {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        self.sprites.insert(
            id,
            Sprite {
                key: sprite_key.to_string(),
                position,
            },
        );
        id
    }

    fn move_sprite(&mut self, id: SpriteId, position: Vec2) {
        match self.sprites.get_mut(&id) {
            Some(sprite) => sprite.position = position,
            None => debug!(?id, "Move for unknown sprite"),
        }
    }

    fn destroy_sprite(&mut self, id: SpriteId) {
        if self.sprites.remove(&id).is_none() {
            debug!(?id, "Destroy for unknown sprite");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_scene_tracks_sprites() {
        let mut scene = HeadlessScene::new();
        let a = scene.create_sprite(Vec2::new(1.0, 2.0), "ship_0001");
        let b = scene.create_sprite(Vec2::new(3.0, 4.0), "ship_0001");
        assert_ne!(a, b);

        scene.move_sprite(a, Vec2::new(5.0, 6.0));
        assert_eq!(scene.get(a).unwrap().position, Vec2::new(5.0, 6.0));

        scene.destroy_sprite(a);
        scene.destroy_sprite(a);
        assert_eq!(scene.len(), 1);
        assert!(scene.get(a).is_none());
    }
}
