//! Synchronization: optimistic local edits, persistence, and full-state
//! replication between clients.

mod command;
mod coordinator;
mod replication;

pub use command::{Operation, ReversibleCommand};
pub use coordinator::{PendingCommit, SyncCoordinator};
pub use replication::{FullStateReplication, ReplicationStrategy};

use crate::fabric::FabricError;
use crate::gateway::GatewayError;
use thiserror::Error;

/// Synchronization errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The gateway rejected a write; the local change was rolled back.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] GatewayError),
    #[error("Realtime fabric error: {0}")]
    Fabric(#[from] FabricError),
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
