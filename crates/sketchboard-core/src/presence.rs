//! Presence and cursor relay.
//!
//! Publishes the local pointer position on every move and keeps the list of
//! other users' cursors from the roster snapshots the fabric delivers.
//! Nothing here is persisted; teardown removes any record the gateway may
//! still hold for the local user.

use crate::elements::parse_color;
use crate::fabric::RealtimeFabric;
use crate::gateway::PersistenceGateway;
use kurbo::{Point, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Fallback cursor color when a profile's color doesn't parse.
const DEFAULT_CURSOR_COLOR: Color = Color::from_rgba8(0x4a, 0x90, 0xd9, 0xff);

/// Display information attached to a presence entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    pub avatar_color: String,
}

impl Profile {
    pub fn new(display_name: impl Into<String>, avatar_color: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            avatar_color: avatar_color.into(),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("Anonymous", "#4a90d9")
    }
}

/// One user's live cursor, in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub user_id: String,
    pub x: f64,
    pub y: f64,
    pub profile: Profile,
}

/// Another user's cursor, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCursor {
    pub user_id: String,
    pub display_name: String,
    pub avatar_color: String,
    /// Position as a fraction of the canvas resolution.
    pub position: Point,
}

impl RemoteCursor {
    /// Build from a roster entry, normalizing against `resolution`.
    pub fn from_payload(payload: &PresencePayload, resolution: Size) -> Self {
        let normalize = |v: f64, extent: f64| if extent > 0.0 { v / extent } else { 0.0 };
        Self {
            user_id: payload.user_id.clone(),
            display_name: payload.profile.display_name.clone(),
            avatar_color: payload.profile.avatar_color.clone(),
            position: Point::new(
                normalize(payload.x, resolution.width),
                normalize(payload.y, resolution.height),
            ),
        }
    }

    pub fn color(&self) -> Color {
        parse_color(&self.avatar_color).unwrap_or(DEFAULT_CURSOR_COLOR)
    }

    /// Position on a canvas of the given resolution.
    pub fn position_in(&self, resolution: Size) -> Point {
        Point::new(
            self.position.x * resolution.width,
            self.position.y * resolution.height,
        )
    }
}

/// Session-scoped presence for one user on one board.
pub struct PresenceRelay {
    board_id: String,
    user_id: String,
    profile: Profile,
    resolution: Size,
    fabric: Rc<dyn RealtimeFabric>,
    gateway: Rc<dyn PersistenceGateway>,
    cursors: Vec<RemoteCursor>,
}

impl PresenceRelay {
    pub fn new(
        board_id: impl Into<String>,
        user_id: impl Into<String>,
        profile: Profile,
        resolution: Size,
        fabric: Rc<dyn RealtimeFabric>,
        gateway: Rc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            board_id: board_id.into(),
            user_id: user_id.into(),
            profile,
            resolution,
            fabric,
            gateway,
            cursors: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Other users currently on the board.
    pub fn cursors(&self) -> &[RemoteCursor] {
        &self.cursors
    }

    /// Publish the local pointer position (canvas coordinates).
    ///
    /// Sent on every call; rate limiting is left to the fabric.
    pub fn track(&self, position: Point) {
        let payload = PresencePayload {
            user_id: self.user_id.clone(),
            x: position.x,
            y: position.y,
            profile: self.profile.clone(),
        };
        if let Err(e) = self.fabric.track(&payload) {
            log::warn!("Failed to publish cursor position: {}", e);
        }
    }

    /// Replace the cursor list from a full roster, dropping the local user.
    pub fn apply_roster(&mut self, roster: &[PresencePayload]) {
        self.cursors = roster
            .iter()
            .filter(|entry| entry.user_id != self.user_id)
            .map(|entry| RemoteCursor::from_payload(entry, self.resolution))
            .collect();
    }

    /// Stop publishing and remove the local record. Failures are logged only.
    pub async fn teardown(&mut self) {
        if let Err(e) = self.fabric.untrack() {
            log::warn!("Failed to untrack presence: {}", e);
        }
        if let Err(e) = self
            .gateway
            .delete_presence(&self.board_id, &self.user_id)
            .await
        {
            log::warn!("Failed to remove presence record for {}: {}", self.user_id, e);
        }
        self.cursors.clear();
    }
}
