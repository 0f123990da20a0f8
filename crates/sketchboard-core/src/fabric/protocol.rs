//! Websocket envelopes exchanged with the relay server.

use super::StateReplace;
use crate::presence::PresencePayload;
use serde::{Deserialize, Serialize};

/// Messages sent to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a board's room
    Join { room: String },
    /// Leave current room
    Leave,
    /// Full-state broadcast
    StateReplace { payload: StateReplace },
    /// Publish the sender's cursor
    Track { presence: PresencePayload },
    /// Withdraw the sender's cursor
    Untrack,
}

/// Messages received from the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirm room join
    Joined { room: String, peer_count: usize },
    /// Peer joined the room
    PeerJoined { peer_id: String },
    /// Peer left the room
    PeerLeft { peer_id: String },
    /// Full-state broadcast from a peer
    StateReplace { from: String, payload: StateReplace },
    /// Presence roster of the room
    PresenceSync { entries: Vec<PresencePayload> },
    /// Error message
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::Profile;

    #[test]
    fn test_client_message_serialize() {
        let msg = ClientMessage::Join { room: "board-1".to_string() };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"join","room":"board-1"}"#);
    }

    #[test]
    fn test_state_replace_keys_are_camel_case() {
        let msg = ClientMessage::StateReplace {
            payload: StateReplace {
                elements: Vec::new(),
                undo_stack: vec![Vec::new()],
                redo_stack: Vec::new(),
                source_id: "client-a".to_string(),
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "state_replace");
        assert_eq!(json["payload"]["sourceId"], "client-a");
        assert_eq!(json["payload"]["undoStack"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_server_message_deserialize() {
        let json = concat!(
            r#"{"type":"presence_sync","entries":[{"userId":"u1","x":1.0,"y":2.0,"#,
            r##""profile":{"displayName":"Ann","avatarColor":"#f00"}}]}"##
        );
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        match msg {
            ServerMessage::PresenceSync { entries } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].profile, Profile::new("Ann", "#f00"));
            }
            _ => panic!("Wrong message type"),
        }
    }
}
