//! Per-session configuration.

use crate::canvas::MAX_UNDO_HISTORY;
use crate::hit::MIN_HIT_THRESHOLD;
use crate::input::CANVAS_RESOLUTION;
use crate::presence::Profile;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid configuration: {0}")]
    Parse(String),
}

/// Who is drawing on which board, and how the canvas behaves.
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub board_id: String,
    pub user_id: String,
    pub profile: Profile,
    /// Internal canvas resolution.
    pub resolution: Size,
    pub undo_limit: usize,
    /// Lower bound for hit-test thresholds.
    pub min_hit_threshold: f64,
    /// Relay server for the websocket fabric.
    pub server_url: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board_id: "default".to_string(),
            user_id: uuid::Uuid::new_v4().to_string(),
            profile: Profile::default(),
            resolution: CANVAS_RESOLUTION,
            undo_limit: MAX_UNDO_HISTORY,
            min_hit_threshold: MIN_HIT_THRESHOLD,
            server_url: None,
        }
    }
}

impl SessionConfig {
    pub fn new(board_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
