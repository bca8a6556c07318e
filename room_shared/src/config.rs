//! Configuration system.
//!
//! Loads client configuration from JSON strings/files. Every field has a
//! default so a partial file only overrides what it names.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the interpolation blend factor relates to elapsed frame time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Apply the blend factor once per frame, whatever the frame duration.
    #[default]
    PerFrame,
    /// Scale the blend by `delta / reference_frame_ms` so smoothing speed is
    /// tied to wall-clock time instead of frame rate.
    TimeScaled,
}

/// Root configuration for the room client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Room server address, e.g. `127.0.0.1:2567`.
    pub server_addr: String,
    /// Room to join (created on the server if it does not exist).
    pub room_name: String,
    /// Frame rate of the headless frame loop.
    pub frame_hz: u32,
    /// Sprite key handed to the scene host for every remote player.
    pub sprite_key: String,
    /// Fraction of the remaining distance closed per interpolation step.
    pub blend_factor: f32,
    pub blend_mode: BlendMode,
    /// Frame duration, in milliseconds, at which `TimeScaled` equals `PerFrame`.
    pub reference_frame_ms: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:2567".to_string(),
            room_name: "my_room".to_string(),
            frame_hz: 60,
            sprite_key: "ship_0001".to_string(),
            blend_factor: 0.2,
            blend_mode: BlendMode::PerFrame,
            reference_frame_ms: 1000.0 / 60.0,
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg = Self::from_json_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded client config");
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ClientConfig::from_json_str(r#"{ "room_name": "lobby" }"#).unwrap();
        assert_eq!(cfg.room_name, "lobby");
        assert_eq!(cfg.server_addr, "127.0.0.1:2567");
        assert_eq!(cfg.blend_factor, 0.2);
        assert_eq!(cfg.blend_mode, BlendMode::PerFrame);
    }

    #[test]
    fn blend_mode_uses_snake_case() {
        let cfg = ClientConfig::from_json_str(r#"{ "blend_mode": "time_scaled" }"#).unwrap();
        assert_eq!(cfg.blend_mode, BlendMode::TimeScaled);
    }

    #[test]
    fn load_reads_file_and_reports_path_on_error() {
        let path = std::env::temp_dir().join(format!("room_client_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "frame_hz": 30 }"#).unwrap();
        let cfg = ClientConfig::load(&path).unwrap();
        assert_eq!(cfg.frame_hz, 30);
        std::fs::remove_file(&path).unwrap();

        let err = ClientConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("read config"));
    }
}
