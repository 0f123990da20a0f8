//! Realtime fabric: per-board broadcast and presence channels.

mod memory;
pub mod protocol;

#[cfg(not(target_arch = "wasm32"))]
mod websocket;

pub use memory::{MemoryFabric, MemoryHub};

#[cfg(not(target_arch = "wasm32"))]
pub use websocket::WebSocketFabric;

use crate::canvas::Snapshot;
use crate::elements::Element;
use crate::presence::PresencePayload;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fabric errors.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error("Not joined to a board")]
    NotJoined,
    #[error("Not connected")]
    NotConnected,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Send failed: {0}")]
    Send(String),
}

/// Result type for fabric operations.
pub type FabricResult<T> = Result<T, FabricError>;

/// Full replicated state, broadcast after every confirmed local change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateReplace {
    pub elements: Vec<Element>,
    pub undo_stack: Vec<Snapshot>,
    pub redo_stack: Vec<Snapshot>,
    /// Client that produced this state.
    pub source_id: String,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events delivered by a fabric, drained with [`RealtimeFabric::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum FabricEvent {
    /// Transport connected
    Connected,
    /// Transport closed
    Disconnected,
    /// Joined a board's channels
    Joined { board_id: String, peer_count: usize },
    PeerJoined { peer_id: String },
    PeerLeft { peer_id: String },
    /// A `state-replace` broadcast, possibly our own echo
    StateReplace(StateReplace),
    /// Full presence roster of the board, including the local user
    PresenceSync { entries: Vec<PresencePayload> },
    Error { message: String },
}

/// Pub/sub transport shared by the coordinator and the presence relay.
///
/// Sends are fire-and-forget: an `Ok` means the message was handed to the
/// transport, not that peers received it.
pub trait RealtimeFabric {
    /// Subscribe to a board's element and presence channels.
    fn join(&self, board_id: &str) -> FabricResult<()>;

    /// Unsubscribe from both channels.
    fn leave(&self) -> FabricResult<()>;

    /// Send a full-state snapshot to every subscriber of the board.
    fn broadcast(&self, payload: &StateReplace) -> FabricResult<()>;

    /// Publish or update the local presence entry.
    fn track(&self, presence: &PresencePayload) -> FabricResult<()>;

    /// Withdraw the local presence entry.
    fn untrack(&self) -> FabricResult<()>;

    /// Drain pending events (non-blocking).
    fn poll_events(&self) -> Vec<FabricEvent>;
}
