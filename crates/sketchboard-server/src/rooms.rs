//! Per-board rooms: membership, presence roster and the broadcast channel.

use dashmap::DashMap;
use sketchboard_core::fabric::protocol::ServerMessage;
use sketchboard_core::presence::PresencePayload;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::broadcast;

pub const CHANNEL_CAPACITY: usize = 256;

/// Who a room broadcast is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Everyone except the sender.
    Others,
    /// Everyone in the room, sender included.
    Everyone,
}

/// A message on a room's channel.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: String,
    pub delivery: Delivery,
    pub message: ServerMessage,
}

impl Envelope {
    /// Whether this envelope should be forwarded to `peer_id`.
    pub fn is_for(&self, peer_id: &str) -> bool {
        self.delivery == Delivery::Everyone || self.from != peer_id
    }
}

struct Room {
    tx: broadcast::Sender<Envelope>,
    peers: HashSet<String>,
    /// Latest cursor per tracking peer.
    presence: BTreeMap<String, PresencePayload>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
            presence: BTreeMap::new(),
        }
    }

    fn roster(&self) -> Vec<PresencePayload> {
        self.presence.values().cloned().collect()
    }
}

/// What a joining peer needs to greet itself with.
pub struct Joined {
    pub rx: broadcast::Receiver<Envelope>,
    pub peer_count: usize,
    pub roster: Vec<PresencePayload>,
}

/// All active rooms.
#[derive(Default)]
pub struct Rooms {
    rooms: DashMap<String, Room>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to a room, creating the room on first join.
    pub fn join(&self, room_id: &str, peer_id: &str) -> Joined {
        let mut room = self.rooms.entry(room_id.to_string()).or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        Joined {
            rx: room.tx.subscribe(),
            peer_count: room.peers.len(),
            roster: room.roster(),
        }
    }

    /// Remove a peer and its cursor. Returns the remaining roster if the
    /// peer had one, so the caller can resync the room.
    pub fn leave(&self, room_id: &str, peer_id: &str) -> Option<Vec<PresencePayload>> {
        let roster = {
            let mut room = self.rooms.get_mut(room_id)?;
            room.peers.remove(peer_id);
            let had_presence = room.presence.remove(peer_id).is_some();
            had_presence.then(|| room.roster())
        };
        // Clean up empty rooms
        self.rooms.remove_if(room_id, |_, room| room.peers.is_empty());
        roster
    }

    /// Record a peer's cursor and return the room's roster.
    pub fn track(
        &self,
        room_id: &str,
        peer_id: &str,
        presence: PresencePayload,
    ) -> Vec<PresencePayload> {
        match self.rooms.get_mut(room_id) {
            Some(mut room) => {
                room.presence.insert(peer_id.to_string(), presence);
                room.roster()
            }
            None => Vec::new(),
        }
    }

    /// Drop a peer's cursor. Returns the roster if it changed.
    pub fn untrack(&self, room_id: &str, peer_id: &str) -> Option<Vec<PresencePayload>> {
        let mut room = self.rooms.get_mut(room_id)?;
        room.presence.remove(peer_id)?;
        Some(room.roster())
    }

    /// Send a message on a room's channel. Rooms without listeners drop it.
    pub fn broadcast(&self, room_id: &str, from: &str, delivery: Delivery, message: ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            let _ = room.tx.send(Envelope {
                from: from.to_string(),
                delivery,
                message,
            });
        }
    }

    pub fn peer_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |room| room.peers.len())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
