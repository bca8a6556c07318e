//! `room_shared`
//!
//! Libraries shared by the room client and anything that speaks its wire
//! protocol (integration test hosts included).
//!
//! Design goals:
//! - Keep the wire format explicit and versionable.
//! - Keep math deterministic and small.
//! - No `unsafe`.

pub mod config;
pub mod math;
pub mod net;
