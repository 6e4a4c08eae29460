//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, RoomInfo, RoomStatus, ServerMessage};
use crate::room::{GameRoom, RoomError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Length of the human-readable code players use to join a room
pub const GAME_CODE_LENGTH: usize = 4;

/// Generate a random code of uppercase letters
pub fn generate_game_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..GAME_CODE_LENGTH)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect()
}

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms, keyed by game code
    pub rooms: DashMap<String, GameRoom>,
    /// Mapping from player ID to their room's game code
    pub player_rooms: DashMap<Uuid, String>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
        }
    }

    /// Create a room under a fresh game code and seat the host in it.
    pub fn create_room(&self, host_id: Uuid, host_name: String, max_players: u8) -> RoomInfo {
        let mut rng = rand::thread_rng();
        loop {
            let code = generate_game_code(&mut rng);
            if let Entry::Vacant(slot) = self.rooms.entry(code.clone()) {
                let room = GameRoom::new(code.clone(), host_id, host_name, max_players);
                let info = room.to_info();
                slot.insert(room);
                self.player_rooms.insert(host_id, code);
                return info;
            }
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    /// Broadcast a message to all players in a room.
    pub fn broadcast_to_room(&self, code: &str, msg: ServerMessage) {
        let members: Vec<Uuid> = match self.rooms.get(code) {
            Some(room) => room.players.keys().copied().collect(),
            None => return,
        };
        for player_id in members {
            self.send_to_player(player_id, msg.clone());
        }
    }

    /// Broadcast a message to all players in a room except one.
    pub fn broadcast_to_room_except(&self, code: &str, except: Uuid, msg: ServerMessage) {
        let members: Vec<Uuid> = match self.rooms.get(code) {
            Some(room) => room.players.keys().copied().collect(),
            None => return,
        };
        for player_id in members.into_iter().filter(|&id| id != except) {
            self.send_to_player(player_id, msg.clone());
        }
    }

    /// Get list of waiting rooms.
    pub fn get_waiting_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .iter()
            .filter(|r| r.status == RoomStatus::Waiting)
            .map(|r| r.to_info())
            .collect()
    }

    fn send_error(&self, player_id: Uuid, message: impl ToString) {
        self.send_to_player(
            player_id,
            ServerMessage::Error {
                message: message.to_string(),
            },
        );
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-player messages describing a room's current game, built under the room lock.
fn game_update(room: &GameRoom, started: bool) -> Vec<(Uuid, ServerMessage)> {
    let Some(state) = room.get_game_state() else {
        return Vec::new();
    };
    let actor = room.get_current_actor();
    let winner = room.get_winner();

    let mut out = Vec::new();
    for &player_id in &room.player_order {
        let snapshot = match (started, room.seat_of(player_id)) {
            (true, Some(seat)) => ServerMessage::GameStarted {
                seat,
                state: state.clone(),
            },
            _ => ServerMessage::GameState {
                state: state.clone(),
            },
        };
        out.push((player_id, snapshot));
        out.push((
            player_id,
            ServerMessage::ValidActions {
                actions: room.get_valid_actions(player_id),
            },
        ));
        out.push((player_id, ServerMessage::TurnChanged { player_index: actor }));
        if let Some((winner, winner_name)) = &winner {
            out.push((
                player_id,
                ServerMessage::GameOver {
                    winner: *winner,
                    winner_name: winner_name.clone(),
                },
            ));
        }
    }
    out
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Bazaar server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a player ID
    let player_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    let welcome = ServerMessage::Welcome { player_id };
    ws_sender
        .send(Message::Text(serde_json::to_string(&welcome)?))
        .await?;

    // Forward queued messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, e);
                    state.send_error(player_id, format!("Invalid message: {}", e));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom {
            player_name,
            max_players,
        } => {
            if state.player_rooms.contains_key(&player_id) {
                state.send_error(player_id, "Leave your current room first");
                return;
            }
            let room = state.create_room(player_id, player_name, max_players);
            info!(code = %room.game_code, host = %player_id, "room created");

            state.send_to_player(
                player_id,
                ServerMessage::RoomCreated {
                    game_code: room.game_code.clone(),
                },
            );
            state.send_to_player(player_id, ServerMessage::JoinedRoom { room });
        }

        ClientMessage::JoinRoom {
            game_code,
            player_name,
        } => {
            if state.player_rooms.contains_key(&player_id) {
                state.send_error(player_id, "Leave your current room first");
                return;
            }
            let code = game_code.trim().to_uppercase();
            let Some(mut room) = state.rooms.get_mut(&code) else {
                state.send_error(player_id, "Room not found");
                return;
            };

            match room.add_player(player_id, player_name) {
                Ok(()) => {
                    let room_info = room.to_info();
                    drop(room); // Release lock before broadcasting
                    state.player_rooms.insert(player_id, code.clone());

                    state.send_to_player(
                        player_id,
                        ServerMessage::JoinedRoom {
                            room: room_info.clone(),
                        },
                    );
                    state.broadcast_to_room_except(
                        &code,
                        player_id,
                        ServerMessage::RoomUpdated { room: room_info },
                    );
                }
                Err(e) => {
                    drop(room);
                    state.send_error(player_id, e);
                }
            }
        }

        ClientMessage::LeaveRoom => {
            if let Some((_, code)) = state.player_rooms.remove(&player_id) {
                leave_room(player_id, &code, state);
                state.send_to_player(player_id, ServerMessage::LeftRoom);
            }
        }

        ClientMessage::StartGame { seed } => {
            let Some(code) = state.player_rooms.get(&player_id).map(|c| c.value().clone()) else {
                state.send_error(player_id, RoomError::PlayerNotInRoom);
                return;
            };
            let Some(mut room) = state.rooms.get_mut(&code) else {
                return;
            };

            match room.start_game(player_id, seed) {
                Ok(()) => {
                    info!(code = %code, players = room.player_count(), "game started");
                    let updates = game_update(&room, true);
                    drop(room);
                    for (to, msg) in updates {
                        state.send_to_player(to, msg);
                    }
                }
                Err(e) => {
                    drop(room);
                    state.send_error(player_id, e);
                }
            }
        }

        ClientMessage::GameAction { action } => {
            let Some(code) = state.player_rooms.get(&player_id).map(|c| c.value().clone()) else {
                state.send_error(player_id, RoomError::PlayerNotInRoom);
                return;
            };
            let Some(mut room) = state.rooms.get_mut(&code) else {
                return;
            };

            match room.apply_action(player_id, action) {
                Ok(()) => {
                    let updates = game_update(&room, false);
                    let reopened = room.game.is_none().then(|| room.to_info());
                    drop(room);

                    state.send_to_player(
                        player_id,
                        ServerMessage::ActionResult {
                            success: true,
                            error: None,
                            error_kind: None,
                        },
                    );
                    for (to, msg) in updates {
                        state.send_to_player(to, msg);
                    }
                    if let Some(room_info) = reopened {
                        state.broadcast_to_room(
                            &code,
                            ServerMessage::RoomUpdated { room: room_info },
                        );
                    }
                }
                Err(e) => {
                    drop(room);
                    let error_kind = match &e {
                        RoomError::Game(game_error) => Some(game_error.kind()),
                        _ => None,
                    };
                    state.send_to_player(
                        player_id,
                        ServerMessage::ActionResult {
                            success: false,
                            error: Some(e.to_string()),
                            error_kind,
                        },
                    );
                }
            }
        }

        ClientMessage::ListRooms => {
            let rooms = state.get_waiting_rooms();
            state.send_to_player(player_id, ServerMessage::RoomList { rooms });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Take a player out of a room, closing the room once it is empty.
fn leave_room(player_id: Uuid, code: &str, state: &Arc<ServerState>) {
    let Some(mut room) = state.rooms.get_mut(code) else {
        return;
    };

    // Keep seats stable once a game is running
    if room.status == RoomStatus::InGame {
        room.set_player_connected(player_id, false);
        let room_info = room.to_info();
        drop(room);
        state.broadcast_to_room(code, ServerMessage::RoomUpdated { room: room_info });
        return;
    }

    let is_empty = room.remove_player(player_id).unwrap_or(false);
    let room_info = room.to_info();
    drop(room);

    if is_empty {
        state.rooms.remove(code);
        info!(code = %code, "room closed");
    } else {
        state.broadcast_to_room(code, ServerMessage::RoomUpdated { room: room_info });
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    if let Some((_, code)) = state.player_rooms.remove(&player_id) {
        leave_room(player_id, &code, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_game_code_format() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let code = generate_game_code(&mut rng);
            assert_eq!(code.len(), GAME_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_create_room_registers_host() {
        let state = ServerState::new();
        let host = Uuid::new_v4();
        let info = state.create_room(host, "Host".to_string(), 4);

        assert!(state.rooms.contains_key(&info.game_code));
        assert_eq!(
            state.player_rooms.get(&host).map(|c| c.value().clone()),
            Some(info.game_code.clone())
        );
        assert_eq!(state.get_waiting_rooms().len(), 1);
    }

    #[test]
    fn test_game_update_per_seat() {
        let state = ServerState::new();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let info = state.create_room(ids[0], "Host".to_string(), 3);
        {
            let mut room = state.rooms.get_mut(&info.game_code).unwrap();
            room.add_player(ids[1], "Bo".to_string()).unwrap();
            room.add_player(ids[2], "Cy".to_string()).unwrap();
            room.start_game(ids[0], Some(3)).unwrap();
        }

        let room = state.rooms.get(&info.game_code).unwrap();
        let updates = game_update(&room, true);
        assert_eq!(updates.len(), 9);
        assert!(updates.iter().any(|(to, msg)| {
            *to == ids[2] && matches!(msg, ServerMessage::GameStarted { seat: 2, .. })
        }));
    }

    #[test]
    fn test_last_player_leaving_closes_room() {
        let state = Arc::new(ServerState::new());
        let host = Uuid::new_v4();
        let info = state.create_room(host, "Host".to_string(), 3);

        handle_disconnect(host, &state);
        assert!(!state.rooms.contains_key(&info.game_code));
        assert!(state.player_rooms.is_empty());
    }
}
