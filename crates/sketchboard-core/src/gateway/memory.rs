//! In-memory gateway for tests and offline sessions.

use super::{BoxFuture, GatewayError, GatewayResult, PersistenceGateway, timestamp};
use crate::elements::{Element, ElementId};
use crate::presence::PresencePayload;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct Boards {
    elements: HashMap<String, Vec<Element>>,
    presence: HashMap<String, Vec<PresencePayload>>,
}

/// In-memory gateway with switchable failure injection.
#[derive(Default)]
pub struct MemoryGateway {
    boards: RwLock<Boards>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert and delete fail with [`GatewayError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make listing fail with [`GatewayError::Unavailable`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a board's stored elements.
    pub fn stored(&self, board_id: &str) -> Vec<Element> {
        self.boards
            .read()
            .map(|b| b.elements.get(board_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Record a durable presence entry, as a hosted backend might keep.
    pub fn put_presence(&self, board_id: &str, entry: PresencePayload) {
        if let Ok(mut boards) = self.boards.write() {
            let entries = boards.presence.entry(board_id.to_string()).or_default();
            entries.retain(|e| e.user_id != entry.user_id);
            entries.push(entry);
        }
    }

    pub fn presence_for_board(&self, board_id: &str) -> Vec<PresencePayload> {
        self.boards
            .read()
            .map(|b| b.presence.get(board_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn check_writes(&self) -> GatewayResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

fn lock_error(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::Other(format!("Lock error: {}", e))
}

impl PersistenceGateway for MemoryGateway {
    fn insert_element(
        &self,
        board_id: &str,
        element: &Element,
    ) -> BoxFuture<'_, GatewayResult<Element>> {
        let board_id = board_id.to_string();
        let mut record = element.clone();
        Box::pin(async move {
            self.check_writes()?;
            let mut boards = self.boards.write().map_err(lock_error)?;
            let elements = boards.elements.entry(board_id).or_default();
            if elements.iter().any(|e| e.id == record.id) {
                return Err(GatewayError::Duplicate(record.id));
            }
            record.created_at = Some(timestamp());
            elements.push(record.clone());
            Ok(record)
        })
    }

    fn delete_elements_by_ids(
        &self,
        board_id: &str,
        ids: &[ElementId],
    ) -> BoxFuture<'_, GatewayResult<()>> {
        let board_id = board_id.to_string();
        let ids: HashSet<ElementId> = ids.iter().copied().collect();
        Box::pin(async move {
            self.check_writes()?;
            let mut boards = self.boards.write().map_err(lock_error)?;
            if let Some(elements) = boards.elements.get_mut(&board_id) {
                elements.retain(|e| !ids.contains(&e.id));
            }
            Ok(())
        })
    }

    fn delete_all_elements_for_board(&self, board_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        let board_id = board_id.to_string();
        Box::pin(async move {
            self.check_writes()?;
            let mut boards = self.boards.write().map_err(lock_error)?;
            boards.elements.remove(&board_id);
            Ok(())
        })
    }

    fn list_elements_for_board(
        &self,
        board_id: &str,
    ) -> BoxFuture<'_, GatewayResult<Vec<Element>>> {
        let board_id = board_id.to_string();
        Box::pin(async move {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(GatewayError::Unavailable("reads disabled".to_string()));
            }
            let boards = self.boards.read().map_err(lock_error)?;
            Ok(boards.elements.get(&board_id).cloned().unwrap_or_default())
        })
    }

    fn delete_presence(&self, board_id: &str, user_id: &str) -> BoxFuture<'_, GatewayResult<()>> {
        let board_id = board_id.to_string();
        let user_id = user_id.to_string();
        Box::pin(async move {
            let mut boards = self.boards.write().map_err(lock_error)?;
            if let Some(entries) = boards.presence.get_mut(&board_id) {
                entries.retain(|e| e.user_id != user_id);
            }
            Ok(())
        })
    }
}
