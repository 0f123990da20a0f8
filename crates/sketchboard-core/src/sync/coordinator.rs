//! Synchronization coordinator.
//!
//! Every local change runs the same pipeline: apply optimistically, persist
//! through the gateway, then either roll back (gateway failure) or broadcast
//! the full state. Undo and redo skip the gateway and broadcast directly.

use super::{
    FullStateReplication, Operation, ReplicationStrategy, ReversibleCommand, SyncError, SyncResult,
};
use crate::canvas::{CanvasState, ToolSettings};
use crate::elements::{Element, ElementId, Shape};
use crate::fabric::{RealtimeFabric, StateReplace};
use crate::gateway::PersistenceGateway;
use std::rc::Rc;
use uuid::Uuid;

/// An operation that has been applied locally but not yet persisted.
#[must_use = "a staged change must be persisted or it is never confirmed"]
#[derive(Debug)]
pub struct PendingCommit {
    command: ReversibleCommand,
}

impl PendingCommit {
    pub fn operation(&self) -> &Operation {
        self.command.operation()
    }
}

/// Owns the local canvas state and keeps it in step with the gateway and
/// peers.
pub struct SyncCoordinator {
    board_id: String,
    user_id: String,
    /// Identity of this client in broadcasts. Distinct per session, so two
    /// tabs of the same user still see each other's changes.
    client_id: String,
    state: CanvasState,
    gateway: Rc<dyn PersistenceGateway>,
    fabric: Rc<dyn RealtimeFabric>,
    replication: Box<dyn ReplicationStrategy>,
}

impl SyncCoordinator {
    pub fn new(
        board_id: impl Into<String>,
        user_id: impl Into<String>,
        state: CanvasState,
        gateway: Rc<dyn PersistenceGateway>,
        fabric: Rc<dyn RealtimeFabric>,
    ) -> Self {
        Self {
            board_id: board_id.into(),
            user_id: user_id.into(),
            client_id: Uuid::new_v4().to_string(),
            state,
            gateway,
            fabric,
            replication: Box::new(FullStateReplication),
        }
    }

    /// Use a fixed client identity instead of a random one.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_replication(mut self, replication: Box<dyn ReplicationStrategy>) -> Self {
        self.replication = replication;
        self
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn elements(&self) -> &[Element] {
        self.state.elements()
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.state.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.state.settings
    }

    /// Build an element authored by the local user with the current tool
    /// settings.
    pub fn element_for(&self, shape: Shape) -> Element {
        Element::new(shape, self.state.settings.style(), self.user_id.clone())
    }

    /// Replace local elements with the board's persisted records.
    ///
    /// History is kept as is. Returns how many elements were loaded.
    pub async fn load(&mut self) -> SyncResult<usize> {
        let gateway = Rc::clone(&self.gateway);
        let elements = gateway.list_elements_for_board(&self.board_id).await?;
        let count = elements.len();
        self.state.load(elements);
        log::info!("Loaded {} elements for board {}", count, self.board_id);
        Ok(count)
    }

    /// Apply an operation optimistically. The returned commit must be handed
    /// to [`SyncCoordinator::persist`].
    pub fn stage(&mut self, operation: Operation) -> PendingCommit {
        let mut command = ReversibleCommand::new(operation);
        command.apply(&mut self.state);
        PendingCommit { command }
    }

    /// Persist a staged operation. Rolls back on failure, broadcasts on
    /// success.
    pub async fn persist(&mut self, pending: PendingCommit) -> SyncResult<()> {
        let PendingCommit { mut command } = pending;
        let gateway = Rc::clone(&self.gateway);
        let board_id = self.board_id.as_str();

        let result = match command.operation() {
            Operation::Add(element) => gateway
                .insert_element(board_id, element)
                .await
                .map(|stored| {
                    log::debug!("Stored element {} at {:?}", stored.id, stored.created_at);
                }),
            Operation::Delete(ids) => gateway.delete_elements_by_ids(board_id, ids).await,
            Operation::Clear => gateway.delete_all_elements_for_board(board_id).await,
        };

        match result {
            Ok(()) => {
                self.publish();
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "Failed to persist {} on board {}: {}",
                    command.operation().name(),
                    self.board_id,
                    e
                );
                command.rollback(&mut self.state);
                Err(SyncError::Persistence(e))
            }
        }
    }

    /// Create an element from `shape` and commit it.
    pub async fn save_element(&mut self, shape: Shape) -> SyncResult<ElementId> {
        let element = self.element_for(shape);
        let id = element.id;
        let pending = self.stage(Operation::Add(element));
        self.persist(pending).await?;
        Ok(id)
    }

    /// Delete a batch of elements in one operation. An empty batch is a
    /// no-op.
    pub async fn delete_elements(&mut self, ids: Vec<ElementId>) -> SyncResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let pending = self.stage(Operation::Delete(ids));
        self.persist(pending).await
    }

    /// Remove every element from the board.
    pub async fn clear_all_elements(&mut self) -> SyncResult<()> {
        let pending = self.stage(Operation::Clear);
        self.persist(pending).await
    }

    /// Step back one snapshot and broadcast. Returns false if there was
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !self.state.undo() {
            return false;
        }
        self.publish();
        true
    }

    /// Step forward one snapshot and broadcast. Returns false if there was
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        if !self.state.redo() {
            return false;
        }
        self.publish();
        true
    }

    /// Handle an incoming `state-replace`. Our own echoes are dropped.
    /// Returns whether local state changed.
    pub fn apply_remote(&mut self, payload: StateReplace) -> bool {
        if payload.source_id == self.client_id {
            log::debug!("Ignoring own state-replace echo");
            return false;
        }
        log::debug!(
            "Applying state-replace from {} ({} elements)",
            payload.source_id,
            payload.elements.len()
        );
        self.replication.incoming(&mut self.state, payload);
        true
    }

    /// Broadcast the current state. Delivery failures are logged and
    /// dropped; the next successful broadcast resynchronizes peers.
    fn publish(&self) {
        let payload = self.replication.outgoing(&self.state, &self.client_id);
        if let Err(e) = self.fabric.broadcast(&payload) {
            log::warn!("Broadcast to board {} failed: {}", self.board_id, e);
        }
    }
}
