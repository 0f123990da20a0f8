//! In-process fabric for tests and single-process multi-client setups.

use super::{FabricError, FabricEvent, FabricResult, RealtimeFabric, StateReplace};
use crate::presence::PresencePayload;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

#[derive(Default)]
struct Member {
    board: Option<String>,
    presence: Option<PresencePayload>,
    events: VecDeque<FabricEvent>,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    members: BTreeMap<u64, Member>,
    fail_sends: bool,
}

impl HubState {
    fn members_of<'a>(&'a self, board: &'a str) -> impl Iterator<Item = u64> + 'a {
        self.members
            .iter()
            .filter(move |(_, m)| m.board.as_deref() == Some(board))
            .map(|(id, _)| *id)
    }

    fn roster(&self, board: &str) -> Vec<PresencePayload> {
        self.members
            .values()
            .filter(|m| m.board.as_deref() == Some(board))
            .filter_map(|m| m.presence.clone())
            .collect()
    }

    fn deliver(&mut self, board: &str, event: FabricEvent) {
        let ids: Vec<u64> = self.members_of(board).collect();
        for id in ids {
            if let Some(member) = self.members.get_mut(&id) {
                member.events.push_back(event.clone());
            }
        }
    }

    fn sync_roster(&mut self, board: &str) {
        let entries = self.roster(board);
        self.deliver(board, FabricEvent::PresenceSync { entries });
    }

    /// Drop a member from its board, notifying the others.
    fn depart(&mut self, id: u64) {
        let Some(member) = self.members.get_mut(&id) else {
            return;
        };
        let Some(board) = member.board.take() else {
            return;
        };
        let had_presence = member.presence.take().is_some();
        self.deliver(&board, FabricEvent::PeerLeft { peer_id: id.to_string() });
        if had_presence {
            self.sync_roster(&board);
        }
    }
}

/// Shared switchboard. Clone it to hand to every client.
///
/// Broadcasts are delivered to every member of the board, sender included,
/// the way hosted realtime services echo to their publisher.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Rc<RefCell<HubState>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new client endpoint.
    pub fn connect(&self) -> MemoryFabric {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        let mut member = Member::default();
        member.events.push_back(FabricEvent::Connected);
        state.members.insert(id, member);
        MemoryFabric {
            hub: self.clone(),
            id,
        }
    }

    /// Make broadcasts and presence updates fail, simulating a dropped link.
    pub fn set_fail_sends(&self, fail: bool) {
        self.state.borrow_mut().fail_sends = fail;
    }

    /// Current presence roster of a board.
    pub fn roster(&self, board_id: &str) -> Vec<PresencePayload> {
        self.state.borrow().roster(board_id)
    }
}

/// One client's endpoint on a [`MemoryHub`].
pub struct MemoryFabric {
    hub: MemoryHub,
    id: u64,
}

impl MemoryFabric {
    fn joined_board(&self) -> FabricResult<String> {
        self.hub
            .state
            .borrow()
            .members
            .get(&self.id)
            .and_then(|m| m.board.clone())
            .ok_or(FabricError::NotJoined)
    }

    fn check_sends(&self) -> FabricResult<()> {
        if self.hub.state.borrow().fail_sends {
            return Err(FabricError::Send("link down".to_string()));
        }
        Ok(())
    }
}

impl RealtimeFabric for MemoryFabric {
    fn join(&self, board_id: &str) -> FabricResult<()> {
        let mut state = self.hub.state.borrow_mut();
        state.depart(self.id);

        let peer_count = state.members_of(board_id).count();
        state.deliver(board_id, FabricEvent::PeerJoined { peer_id: self.id.to_string() });
        let roster = state.roster(board_id);
        let member = state.members.get_mut(&self.id).ok_or(FabricError::NotConnected)?;
        member.board = Some(board_id.to_string());
        member.events.push_back(FabricEvent::Joined {
            board_id: board_id.to_string(),
            peer_count: peer_count + 1,
        });
        member.events.push_back(FabricEvent::PresenceSync { entries: roster });
        Ok(())
    }

    fn leave(&self) -> FabricResult<()> {
        self.hub.state.borrow_mut().depart(self.id);
        Ok(())
    }

    fn broadcast(&self, payload: &StateReplace) -> FabricResult<()> {
        let board = self.joined_board()?;
        self.check_sends()?;
        self.hub
            .state
            .borrow_mut()
            .deliver(&board, FabricEvent::StateReplace(payload.clone()));
        Ok(())
    }

    fn track(&self, presence: &PresencePayload) -> FabricResult<()> {
        let board = self.joined_board()?;
        self.check_sends()?;
        let mut state = self.hub.state.borrow_mut();
        if let Some(member) = state.members.get_mut(&self.id) {
            member.presence = Some(presence.clone());
        }
        state.sync_roster(&board);
        Ok(())
    }

    fn untrack(&self) -> FabricResult<()> {
        let mut state = self.hub.state.borrow_mut();
        let Some(member) = state.members.get_mut(&self.id) else {
            return Ok(());
        };
        if member.presence.take().is_some() {
            if let Some(board) = member.board.clone() {
                state.sync_roster(&board);
            }
        }
        Ok(())
    }

    fn poll_events(&self) -> Vec<FabricEvent> {
        self.hub
            .state
            .borrow_mut()
            .members
            .get_mut(&self.id)
            .map(|m| m.events.drain(..).collect())
            .unwrap_or_default()
    }
}

impl Drop for MemoryFabric {
    fn drop(&mut self) {
        if let Ok(mut state) = self.hub.state.try_borrow_mut() {
            state.depart(self.id);
            state.members.remove(&self.id);
        }
    }
}
