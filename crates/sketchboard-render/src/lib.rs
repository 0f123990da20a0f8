//! SketchBoard Render Library
//!
//! Backends for the core drawing engine. The default backend records into a
//! Vello [`Scene`](vello::Scene) for GPU rendering by the host.

#[cfg(feature = "vello-renderer")]
mod scene;

#[cfg(feature = "vello-renderer")]
pub use scene::SceneSurface;

pub use sketchboard_core::draw::{RecordingSurface, Surface};
