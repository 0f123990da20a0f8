//! SketchBoard Core Library
//!
//! Collaborative drawing core: element model, hit detection, drawing engine,
//! tool routing, optimistic synchronization and presence.

pub mod canvas;
pub mod config;
pub mod draw;
pub mod elements;
pub mod fabric;
pub mod gateway;
pub mod hit;
pub mod input;
pub mod presence;
pub mod session;
pub mod sync;
pub mod tools;

pub use canvas::{CanvasState, HistorySnapshot, MAX_UNDO_HISTORY, ToolSettings};
pub use config::{ConfigError, SessionConfig};
pub use draw::{DrawOp, RecordingSurface, Surface};
pub use elements::{Element, ElementId, ElementStyle, ElementType, Shape};
pub use fabric::{FabricError, FabricEvent, MemoryHub, RealtimeFabric, StateReplace};
pub use gateway::{GatewayError, MemoryGateway, PersistenceGateway};
pub use input::{CANVAS_RESOLUTION, PointerEvent, ViewportTransform};
pub use presence::{PresencePayload, PresenceRelay, Profile, RemoteCursor};
pub use session::WhiteboardSession;
pub use sync::{SyncCoordinator, SyncError};
pub use tools::{CommitRequest, InteractionRouter, TextPrompt, ToolKind};

#[cfg(not(target_arch = "wasm32"))]
pub use fabric::WebSocketFabric;
#[cfg(not(target_arch = "wasm32"))]
pub use gateway::FileGateway;
