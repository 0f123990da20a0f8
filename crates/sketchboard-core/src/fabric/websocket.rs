//! Native websocket fabric talking to `sketchboard-server`.
//!
//! The socket lives on a background thread; commands and events cross over
//! mpsc channels so every trait call stays non-blocking.

use super::protocol::{ClientMessage, ServerMessage};
use super::{
    ConnectionState, FabricError, FabricEvent, FabricResult, RealtimeFabric, StateReplace,
};
use crate::presence::PresencePayload;
use std::cell::{Cell, RefCell};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{Message, connect};
use url::Url;

/// Longest prefix of an outgoing message written to the debug log, in chars.
const LOG_PREVIEW_CHARS: usize = 100;

/// Commands sent to the WebSocket thread.
enum WsCommand {
    Send(String),
    Close,
}

/// Websocket client for the relay server.
pub struct WebSocketFabric {
    state: Cell<ConnectionState>,
    board: RefCell<Option<String>>,
    /// Channel to send commands to the WebSocket thread.
    cmd_tx: Sender<WsCommand>,
    /// Channel to receive events from the WebSocket thread.
    event_rx: Receiver<FabricEvent>,
    _thread: JoinHandle<()>,
}

impl WebSocketFabric {
    /// Connect to a relay server at a `ws://` or `wss://` URL.
    pub fn connect(url: &str) -> FabricResult<Self> {
        let parsed_url = Url::parse(url).map_err(|e| FabricError::InvalidUrl(e.to_string()))?;
        if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
            return Err(FabricError::InvalidUrl(format!(
                "Invalid WebSocket URL scheme: {}",
                parsed_url.scheme()
            )));
        }

        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<FabricEvent>();
        let url = url.to_string();
        let handle = thread::spawn(move || run_socket(&url, cmd_rx, event_tx));

        Ok(Self {
            state: Cell::new(ConnectionState::Connecting),
            board: RefCell::new(None),
            cmd_tx,
            event_rx,
            _thread: handle,
        })
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state.get() == ConnectionState::Connected
    }

    fn send(&self, message: &ClientMessage) -> FabricResult<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| FabricError::Serialization(e.to_string()))?;
        self.cmd_tx
            .send(WsCommand::Send(json))
            .map_err(|e| FabricError::Send(e.to_string()))
    }

    fn require_board(&self) -> FabricResult<()> {
        if self.board.borrow().is_none() {
            return Err(FabricError::NotJoined);
        }
        Ok(())
    }
}

impl RealtimeFabric for WebSocketFabric {
    fn join(&self, board_id: &str) -> FabricResult<()> {
        self.send(&ClientMessage::Join { room: board_id.to_string() })?;
        *self.board.borrow_mut() = Some(board_id.to_string());
        Ok(())
    }

    fn leave(&self) -> FabricResult<()> {
        if self.board.borrow_mut().take().is_some() {
            self.send(&ClientMessage::Leave)?;
        }
        Ok(())
    }

    fn broadcast(&self, payload: &StateReplace) -> FabricResult<()> {
        self.require_board()?;
        self.send(&ClientMessage::StateReplace { payload: payload.clone() })
    }

    fn track(&self, presence: &PresencePayload) -> FabricResult<()> {
        self.require_board()?;
        self.send(&ClientMessage::Track { presence: presence.clone() })
    }

    fn untrack(&self) -> FabricResult<()> {
        self.require_board()?;
        self.send(&ClientMessage::Untrack)
    }

    fn poll_events(&self) -> Vec<FabricEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            match &event {
                FabricEvent::Connected => self.state.set(ConnectionState::Connected),
                FabricEvent::Disconnected => self.state.set(ConnectionState::Disconnected),
                FabricEvent::Error { .. } => self.state.set(ConnectionState::Error),
                _ => {}
            }
            events.push(event);
        }
        events
    }
}

impl Drop for WebSocketFabric {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(WsCommand::Close);
    }
}

/// Prefix of `msg` for logging, cut on a char boundary.
fn log_preview(msg: &str) -> &str {
    msg.char_indices()
        .nth(LOG_PREVIEW_CHARS)
        .map_or(msg, |(end, _)| &msg[..end])
}

fn server_event(msg: ServerMessage) -> FabricEvent {
    match msg {
        ServerMessage::Joined { room, peer_count } => FabricEvent::Joined {
            board_id: room,
            peer_count,
        },
        ServerMessage::PeerJoined { peer_id } => FabricEvent::PeerJoined { peer_id },
        ServerMessage::PeerLeft { peer_id } => FabricEvent::PeerLeft { peer_id },
        ServerMessage::StateReplace { payload, .. } => FabricEvent::StateReplace(payload),
        ServerMessage::PresenceSync { entries } => FabricEvent::PresenceSync { entries },
        ServerMessage::Error { message } => FabricEvent::Error { message },
    }
}

/// Socket thread body: pump commands out and server messages in until
/// either side closes.
fn run_socket(url: &str, cmd_rx: Receiver<WsCommand>, event_tx: Sender<FabricEvent>) {
    log::info!("WebSocket thread: connecting to {}", url);

    let (mut socket, response) = match connect(url) {
        Ok(connected) => connected,
        Err(e) => {
            log::error!("WebSocket connection failed: {}", e);
            let _ = event_tx.send(FabricEvent::Error {
                message: format!("Connection failed: {}", e),
            });
            return;
        }
    };
    log::info!("WebSocket connected, status: {}", response.status());
    let _ = event_tx.send(FabricEvent::Connected);

    // Short read timeout so the loop can interleave outgoing commands.
    match socket.get_mut() {
        tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => log::debug!("TLS or other stream - using default timeout handling"),
    }

    loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(msg)) => {
                log::debug!("WebSocket sending: {}", log_preview(&msg));
                if let Err(e) = socket.send(Message::Text(msg.into())) {
                    log::error!("WebSocket send error: {}", e);
                    break;
                }
            }
            Ok(WsCommand::Close) => {
                log::info!("WebSocket close requested");
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(txt)) => match serde_json::from_str::<ServerMessage>(&txt) {
                Ok(msg) => {
                    let _ = event_tx.send(server_event(msg));
                }
                Err(e) => log::warn!("Failed to parse server message: {}", e),
            },
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                log::info!("WebSocket received close frame");
                break;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                log::error!("WebSocket read error: {}", e);
                break;
            }
        }
    }

    log::info!("WebSocket thread exiting");
    let _ = event_tx.send(FabricEvent::Disconnected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::Profile;
    use std::net::TcpListener;

    #[test]
    fn test_rejects_non_websocket_scheme() {
        assert!(matches!(
            WebSocketFabric::connect("http://localhost:3030/ws"),
            Err(FabricError::InvalidUrl(_))
        ));
        assert!(matches!(
            WebSocketFabric::connect("not a url"),
            Err(FabricError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_server_message_mapping() {
        let event = server_event(ServerMessage::Joined {
            room: "board".to_string(),
            peer_count: 3,
        });
        assert_eq!(
            event,
            FabricEvent::Joined {
                board_id: "board".to_string(),
                peer_count: 3
            }
        );
    }

    #[test]
    fn test_log_preview_cuts_on_char_boundary() {
        let ascii = "a".repeat(150);
        assert_eq!(log_preview(&ascii).len(), LOG_PREVIEW_CHARS);
        assert_eq!(log_preview("short"), "short");

        // 'é' is two bytes, so one straddles byte 100.
        let accented = format!("{}{}", "a".repeat(99), "é".repeat(10));
        let preview = log_preview(&accented);
        assert_eq!(preview.chars().count(), LOG_PREVIEW_CHARS);
        assert!(accented.starts_with(preview));
    }

    #[test]
    fn test_multibyte_presence_keeps_socket_alive() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let (seen_tx, seen_rx) = channel::<ClientMessage>();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut socket = tungstenite::accept(stream).unwrap();
            let mut tracks = 0;
            while tracks < 2 {
                match socket.read() {
                    Ok(Message::Text(txt)) => {
                        let msg: ClientMessage = serde_json::from_str(&txt.to_string()).unwrap();
                        if matches!(msg, ClientMessage::Track { .. }) {
                            tracks += 1;
                        }
                        let _ = seen_tx.send(msg);
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        });

        // Outgoing messages are previewed only when debug logging is on.
        log::set_max_level(log::LevelFilter::Debug);
        let fabric = WebSocketFabric::connect(&url).unwrap();
        fabric.join("board").unwrap();
        // The serialized track puts a two-byte 'é' across byte 100.
        let presence = PresencePayload {
            user_id: "u12".to_string(),
            x: 1.0,
            y: 2.0,
            profile: Profile::new("é".repeat(60), "#ff0000"),
        };
        fabric.track(&presence).unwrap();
        fabric.track(&presence).unwrap();

        let received: Vec<ClientMessage> = (0..3)
            .map(|_| seen_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        server.join().unwrap();

        assert!(matches!(&received[0], ClientMessage::Join { room } if room == "board"));
        for msg in &received[1..] {
            match msg {
                ClientMessage::Track { presence: sent } => assert_eq!(sent, &presence),
                other => panic!("unexpected message {:?}", other),
            }
        }
    }

    #[test]
    fn test_sends_require_join() {
        // Nothing listens on port 9; the socket thread reports the failure
        // asynchronously while local checks still apply.
        let fabric = WebSocketFabric::connect("ws://127.0.0.1:9/ws").unwrap();
        assert!(matches!(fabric.untrack(), Err(FabricError::NotJoined)));
    }
}
