//! WebSocket protocol messages for Bazaar multiplayer.

use bazaar_core::{ErrorKind, GameAction, PlayerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game room
    CreateRoom { player_name: String, max_players: u8 },

    /// Join an existing room by its game code
    JoinRoom { game_code: String, player_name: String },

    /// Leave current room
    LeaveRoom,

    /// Start the game (host only)
    StartGame {
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Submit a game action
    GameAction { action: serde_json::Value },

    /// Request room list
    ListRooms,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned connection ID
    Welcome { player_id: Uuid },

    /// Room created successfully
    RoomCreated { game_code: String },

    /// Joined room successfully
    JoinedRoom { room: RoomInfo },

    /// Left room successfully
    LeftRoom,

    /// Room state updated (player joined/left)
    RoomUpdated { room: RoomInfo },

    /// Game started; `seat` is the receiving player's index
    GameStarted {
        seat: PlayerId,
        state: serde_json::Value,
    },

    /// Game state updated
    GameState { state: serde_json::Value },

    /// Outcome of the sender's last action
    ActionResult {
        success: bool,
        error: Option<String>,
        error_kind: Option<ErrorKind>,
    },

    /// Actions the receiving player can submit right now
    ValidActions { actions: Vec<GameAction> },

    /// The player the game is waiting on changed
    TurnChanged { player_index: Option<PlayerId> },

    /// List of rooms waiting for players
    RoomList { rooms: Vec<RoomInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,

    /// Game finished
    GameOver {
        winner: PlayerId,
        winner_name: String,
    },
}

/// Room information for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub game_code: String,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
}

/// Player information in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    /// Seat in the running game, once started
    pub seat: Option<PlayerId>,
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_format() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"JoinRoom","payload":{"game_code":"QWER","player_name":"Ana"}}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::JoinRoom { ref game_code, .. } if game_code == "QWER"
        ));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"StartGame","payload":{}}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartGame { seed: None }));
    }

    #[test]
    fn test_server_message_format() {
        let json = serde_json::to_value(ServerMessage::ValidActions {
            actions: vec![GameAction::DeclareDone { player_id: 2 }],
        })
        .unwrap();
        assert_eq!(json["type"], "ValidActions");
        assert_eq!(json["payload"]["actions"][0]["type"], "DECLARE_DONE");
    }
}
