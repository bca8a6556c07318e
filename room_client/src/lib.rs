//! `room_client`
//!
//! Client-side systems for a server-authoritative room:
//! - Room abstraction and a TCP room transport
//! - Remote entity registry kept in sync with the room's `players`
//! - Per-frame input transmission
//! - Interpolation of remote positions toward authoritative state
//! - Scene host abstraction (headless implementation included)

pub mod host;
pub mod input;
pub mod interp;
pub mod registry;
pub mod room;
pub mod scene;
pub mod transport;

pub use scene::GameScene;
