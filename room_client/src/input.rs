//! Input handling.
//!
//! A real host would poll keyboard/gamepad state each frame. The core only
//! needs to ask whether each direction is held, and copies the answer into the
//! session's single [`InputSnapshot`].

use std::fmt;

use room_shared::net::InputSnapshot;

/// The four directional controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}

/// Source of physical control state.
pub trait InputDevice {
    fn is_down(&self, direction: Direction) -> bool;
}

/// Held/released state for each direction, toggled by whoever owns the keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    held: [bool; 4],
}

impl KeyState {
    pub fn press(&mut self, direction: Direction) {
        self.held[direction.index()] = true;
    }

    pub fn release(&mut self, direction: Direction) {
        self.held[direction.index()] = false;
    }

    pub fn release_all(&mut self) {
        self.held = [false; 4];
    }
}

impl InputDevice for KeyState {
    fn is_down(&self, direction: Direction) -> bool {
        self.held[direction.index()]
    }
}

/// Overwrites `snapshot` with the device state at this instant.
pub fn sample_input<D: InputDevice + ?Sized>(device: &D, snapshot: &mut InputSnapshot) {
    snapshot.left = device.is_down(Direction::Left);
    snapshot.right = device.is_down(Direction::Right);
    snapshot.up = device.is_down(Direction::Up);
    snapshot.down = device.is_down(Direction::Down);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_mirrors_device_and_overwrites() {
        let mut keys = KeyState::default();
        let mut snapshot = InputSnapshot {
            left: true,
            right: true,
            up: true,
            down: true,
        };

        keys.press(Direction::Up);
        sample_input(&keys, &mut snapshot);
        assert_eq!(
            snapshot,
            InputSnapshot {
                left: false,
                right: false,
                up: true,
                down: false,
            }
        );

        keys.release(Direction::Up);
        keys.press(Direction::Left);
        sample_input(&keys, &mut snapshot);
        assert!(snapshot.left && !snapshot.up);
    }

    #[test]
    fn direction_names() {
        for dir in Direction::ALL {
            assert_eq!(Direction::parse(&dir.to_string()), Some(dir));
        }
        assert_eq!(Direction::parse("LEFT"), Some(Direction::Left));
        assert_eq!(Direction::parse("jump"), None);
    }
}
