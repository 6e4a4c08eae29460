//! Game room management.

use bazaar_core::{
    create_initial_state, transition, GameAction, GameError, GameState, PlayerId, MAX_NAME_LENGTH,
    MAX_PLAYERS, MIN_PLAYERS,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomStatus};

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not enough players")]
    NotEnoughPlayers,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Player name must be 1-{max} characters", max = MAX_NAME_LENGTH)]
    InvalidName,

    #[error("Name {0:?} is already taken in this room")]
    NameTaken(String),

    #[error("You can only act for your own seat")]
    WrongSeat,

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    /// Index in the game, assigned when the game starts
    pub seat: Option<PlayerId>,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
            seat: None,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            connected: self.connected,
            seat: self.seat,
        }
    }
}

/// A game room that hosts one Bazaar game.
pub struct GameRoom {
    pub code: String,
    pub name: String,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Join order, which becomes seat order
    pub player_order: Vec<Uuid>,
    /// The game state (once started)
    pub game: Option<GameState>,
}

impl GameRoom {
    pub fn new(code: String, host_id: Uuid, host_name: String, max_players: u8) -> Self {
        let host_name = host_name.trim().to_string();
        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Self {
            code,
            name: format!("{}'s Bazaar", host_name),
            max_players: max_players.clamp(MIN_PLAYERS as u8, MAX_PLAYERS as u8),
            host_id,
            status: RoomStatus::Waiting,
            players,
            player_order: vec![host_id],
            game: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        let name = name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(RoomError::InvalidName);
        }
        if self
            .players
            .values()
            .any(|p| p.name.to_lowercase() == name.to_lowercase())
        {
            return Err(RoomError::NameTaken(name));
        }

        self.players.insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.players.remove(&player_id);
        self.player_order.retain(|&id| id != player_id);

        // If host left, assign new host
        if player_id == self.host_id && !self.player_order.is_empty() {
            self.host_id = self.player_order[0];
        }

        // Return true if room is now empty
        Ok(self.players.is_empty())
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    pub fn start_game(&mut self, requester_id: Uuid, seed: Option<u64>) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(RoomError::NotEnoughPlayers);
        }

        let player_names: Vec<String> = self
            .player_order
            .iter()
            .filter_map(|id| self.players.get(id).map(|p| p.name.clone()))
            .collect();

        let game = transition(
            &create_initial_state(),
            GameAction::StartGame {
                player_names,
                seed,
            },
        )?;

        for (seat, player_id) in self.player_order.iter().enumerate() {
            if let Some(player) = self.players.get_mut(player_id) {
                player.seat = Some(seat);
            }
        }
        self.game = Some(game);
        self.status = RoomStatus::InGame;

        Ok(())
    }

    pub fn seat_of(&self, player_id: Uuid) -> Option<PlayerId> {
        self.players.get(&player_id)?.seat
    }

    pub fn apply_action(
        &mut self,
        player_id: Uuid,
        action: serde_json::Value,
    ) -> Result<(), RoomError> {
        let game = self.game.as_ref().ok_or(RoomError::GameNotStarted)?;

        let seat = self
            .players
            .get(&player_id)
            .ok_or(RoomError::PlayerNotInRoom)?
            .seat
            .ok_or(RoomError::PlayerNotInRoom)?;

        let action: GameAction = serde_json::from_value(action)
            .map_err(|e| RoomError::InvalidAction(e.to_string()))?;

        match action {
            GameAction::StartGame { .. } => return Err(RoomError::GameAlreadyStarted),
            GameAction::ResetGame if player_id != self.host_id => return Err(RoomError::NotHost),
            GameAction::ResetGame => {
                self.reset();
                return Ok(());
            }
            _ => {}
        }
        if action.actor().is_some_and(|actor| actor != seat) {
            return Err(RoomError::WrongSeat);
        }

        let next = transition(game, action)?;
        debug!(room = %self.code, seat, phase = ?next.current_phase, "action applied");

        if next.is_finished() {
            self.status = RoomStatus::Finished;
        }
        self.game = Some(next);

        Ok(())
    }

    /// Drop the running game and reopen the room for a fresh start.
    fn reset(&mut self) {
        self.game = None;
        self.status = RoomStatus::Waiting;
        for player in self.players.values_mut() {
            player.seat = None;
        }
        debug!(room = %self.code, "game reset, room back to waiting");
    }

    pub fn get_game_state(&self) -> Option<serde_json::Value> {
        self.game.as_ref().and_then(|g| g.snapshot().ok())
    }

    /// Valid actions for the connection `player_id`, from their seat
    pub fn get_valid_actions(&self, player_id: Uuid) -> Vec<GameAction> {
        match (self.game.as_ref(), self.seat_of(player_id)) {
            (Some(game), Some(seat)) => game.valid_actions(seat),
            _ => Vec::new(),
        }
    }

    pub fn get_current_actor(&self) -> Option<PlayerId> {
        self.game.as_ref().and_then(GameState::current_actor)
    }

    pub fn get_winner(&self) -> Option<(PlayerId, String)> {
        let game = self.game.as_ref()?;
        let winner = game.winner?;
        let winner_id = self.player_order.get(winner)?;
        let winner_name = self.players.get(winner_id)?.name.clone();
        Some((winner, winner_name))
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            game_code: self.code.clone(),
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            max_players: self.max_players,
            host_id: self.host_id,
            status: self.status,
        }
    }
}
