//! Persistence gateway: durable element records per board.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryGateway;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileGateway;

use crate::elements::{Element, ElementId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Board not found: {0}")]
    NotFound(String),
    #[error("Element already exists: {0}")]
    Duplicate(ElementId),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
    #[error("Gateway error: {0}")]
    Other(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Boxed future for async gateway calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable element store consumed by the synchronization layer.
///
/// Element records are written one per commit and are never rewritten by
/// undo/redo. Implementations stamp `created_at` on insert.
pub trait PersistenceGateway {
    /// Store a new element. Returns the stored record.
    fn insert_element(&self, board_id: &str, element: &Element)
    -> BoxFuture<'_, GatewayResult<Element>>;

    /// Delete the given elements. Unknown ids are ignored.
    fn delete_elements_by_ids(
        &self,
        board_id: &str,
        ids: &[ElementId],
    ) -> BoxFuture<'_, GatewayResult<()>>;

    /// Delete every element of a board.
    fn delete_all_elements_for_board(&self, board_id: &str) -> BoxFuture<'_, GatewayResult<()>>;

    /// All elements of a board in creation order. Unknown boards are empty.
    fn list_elements_for_board(&self, board_id: &str) -> BoxFuture<'_, GatewayResult<Vec<Element>>>;

    /// Remove any durable presence record left for a user.
    fn delete_presence(&self, board_id: &str, user_id: &str) -> BoxFuture<'_, GatewayResult<()>>;
}

/// Creation timestamp in RFC 3339.
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
