//! SketchBoard WebSocket Relay Server
//!
//! Relays full-state broadcasts and presence rosters between clients drawing
//! on the same board. The server keeps no element data; persistence is the
//! clients' business.
//!
//! ## Protocol
//!
//! Messages are JSON tagged by `type`:
//! ```json
//! { "type": "join", "room": "board-id" }
//! { "type": "state_replace", "payload": {
//!     "elements": [], "undoStack": [], "redoStack": [], "sourceId": "..."
//! } }
//! { "type": "track", "presence": { "userId": "...", "x": 100, "y": 200, "profile": { ... } } }
//! ```

mod config;
mod rooms;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use config::ServerConfig;
use futures_util::{SinkExt, StreamExt};
use rooms::{Delivery, Envelope, Rooms};
use sketchboard_core::fabric::protocol::{ClientMessage, ServerMessage};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shared application state
struct AppState {
    rooms: Rooms,
    config: ServerConfig,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchboard_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let addr = config.addr;
    let state = Arc::new(AppState {
        rooms: Rooms::new(),
        config,
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("SketchBoard relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// Index page
async fn index() -> &'static str {
    "SketchBoard Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to encode server message: {}", e);
            None
        }
    }
}

/// Leave a room, telling the remaining peers and resyncing their roster.
fn depart(state: &AppState, room: &str, peer_id: &str) {
    let roster = state.rooms.leave(room, peer_id);
    state.rooms.broadcast(
        room,
        peer_id,
        Delivery::Others,
        ServerMessage::PeerLeft { peer_id: peer_id.to_string() },
    );
    if let Some(entries) = roster {
        state
            .rooms
            .broadcast(room, peer_id, Delivery::Others, ServerMessage::PresenceSync { entries });
    }
    info!(
        "Peer {} left room {} ({} remaining, {} active rooms)",
        peer_id,
        room,
        state.rooms.peer_count(room),
        state.rooms.room_count()
    );
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<String> = None;
    let mut room_rx: Option<broadcast::Receiver<Envelope>> = None;

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue, // Ignore binary and ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                };

                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("Invalid message from {}: {}", peer_id, e);
                        let err = ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        };
                        if let Some(reply) = encode(&err) {
                            let _ = sender.send(reply).await;
                        }
                        continue;
                    }
                };

                match client_msg {
                    ClientMessage::Join { room } => {
                        if let Some(old_room) = current_room.take() {
                            depart(&state, &old_room, &peer_id);
                        }

                        let joined = state.rooms.join(&room, &peer_id);
                        room_rx = Some(joined.rx);
                        current_room = Some(room.clone());

                        let greeting = [
                            ServerMessage::Joined {
                                room: room.clone(),
                                peer_count: joined.peer_count,
                            },
                            ServerMessage::PresenceSync { entries: joined.roster },
                        ];
                        let mut closed = false;
                        for msg in greeting.iter().filter_map(encode) {
                            if sender.send(msg).await.is_err() {
                                closed = true;
                                break;
                            }
                        }
                        if closed {
                            break;
                        }

                        state.rooms.broadcast(
                            &room,
                            &peer_id,
                            Delivery::Others,
                            ServerMessage::PeerJoined { peer_id: peer_id.clone() },
                        );
                        info!(
                            "Peer {} joined room {} ({} peers)",
                            peer_id, room, joined.peer_count
                        );
                    }
                    ClientMessage::Leave => {
                        if let Some(room) = current_room.take() {
                            depart(&state, &room, &peer_id);
                        }
                        room_rx = None;
                    }
                    ClientMessage::StateReplace { payload } => {
                        let Some(room) = current_room.as_deref() else {
                            continue;
                        };
                        debug!(
                            "Relaying {} elements from {} in room {}",
                            payload.elements.len(),
                            peer_id,
                            room
                        );
                        let delivery = if state.config.echo_self {
                            Delivery::Everyone
                        } else {
                            Delivery::Others
                        };
                        state.rooms.broadcast(
                            room,
                            &peer_id,
                            delivery,
                            ServerMessage::StateReplace { from: peer_id.clone(), payload },
                        );
                    }
                    ClientMessage::Track { presence } => {
                        if let Some(room) = current_room.as_deref() {
                            let entries = state.rooms.track(room, &peer_id, presence);
                            let sync = ServerMessage::PresenceSync { entries };
                            state.rooms.broadcast(room, &peer_id, Delivery::Everyone, sync);
                        }
                    }
                    ClientMessage::Untrack => {
                        if let Some(room) = current_room.as_deref() {
                            if let Some(entries) = state.rooms.untrack(room, &peer_id) {
                                let sync = ServerMessage::PresenceSync { entries };
                                state.rooms.broadcast(room, &peer_id, Delivery::Everyone, sync);
                            }
                        }
                    }
                }
            }

            // Handle broadcast messages from room
            envelope = async {
                match &mut room_rx {
                    Some(rx) => rx.recv().await,
                    None => {
                        // No room joined, just wait forever
                        std::future::pending().await
                    }
                }
            } => {
                match envelope {
                    Ok(envelope) if envelope.is_for(&peer_id) => {
                        if let Some(msg) = encode(&envelope.message) {
                            if sender.send(msg).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Peer {} lagged, skipped {} messages", peer_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        room_rx = None;
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(room) = current_room {
        depart(&state, &room, &peer_id);
    }
    info!("Connection closed: {}", peer_id);
}
