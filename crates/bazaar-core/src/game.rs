//! Core game state machine.
//!
//! This module contains the `GameState` struct and the `transition` entry
//! point. Every action is applied to a working copy of the state; if the
//! handler rejects the action the copy is dropped and the caller keeps the
//! untouched original.

use crate::actions::GameAction;
use crate::card::{build_deck, shuffle, Card, DECK_SIZE};
use crate::effects::EffectState;
use crate::error::GameError;
use crate::phase::{is_action_allowed, next_phase, GamePhase, PHASE_ORDER};
use crate::player::{OfferCard, Player, PlayerId};
use crate::turn::rotation_order;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Cards each player holds after dealing
pub const HAND_SIZE: usize = 5;

/// Cards in a freshly placed offer
pub const OFFER_SIZE: usize = 3;

/// Points needed to win (with a strict lead)
pub const POINTS_TO_WIN: u32 = 5;

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 6;
pub const MAX_NAME_LENGTH: usize = 20;

/// What the orchestrator does once a handler has succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Wait for another action in the same phase
    Stay,
    /// Run the automatic logic of the phase the state is now in
    EnterPhase,
    /// The current phase is over; advance and cascade
    CompletePhase,
}

/// Outcome of a phase's automatic logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseEntry {
    /// Someone has to act before the phase can end
    AwaitInput,
    /// Nothing to wait for
    Continue,
}

/// Where each offer went during distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub round: u32,
    pub buyer_index: PlayerId,
    pub chosen_seller: Option<PlayerId>,
    pub transfers: Vec<OfferTransfer>,
}

/// One offer moving into a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTransfer {
    pub seller_index: PlayerId,
    pub recipient_index: PlayerId,
    pub card_ids: Vec<String>,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// All players, in seat order
    pub players: Vec<Player>,
    /// This round's buyer
    pub current_buyer_index: PlayerId,
    /// Money-bag holder, who becomes buyer next round
    pub next_buyer_index: PlayerId,
    pub current_phase: GamePhase,
    pub current_player_index: PlayerId,
    /// Round number (starts at 1)
    pub round: u32,
    pub draw_pile: Vec<Card>,
    pub discard_pile: Vec<Card>,
    /// Set once, after which the game is frozen
    pub winner: Option<PlayerId>,
    /// Effect waiting on a follow-up selection
    pub effect: Option<EffectState>,
    /// Per-player "done" flags for the action phase
    pub action_phase_done: Vec<bool>,
    /// Seller whose offer the buyer chose this round
    pub selected_seller: Option<PlayerId>,
    /// Record of the most recent offer distribution
    pub distribution_summary: Option<DistributionSummary>,
    /// Player whose view the UI is showing
    pub perspective: PlayerId,
    /// Seed for the next random draw (for deterministic replays).
    /// Never included in `snapshot`.
    #[serde(default)]
    rng_seed: u64,
}

impl Default for GameState {
    fn default() -> Self {
        create_initial_state()
    }
}

/// The empty state a game starts from before START_GAME
pub fn create_initial_state() -> GameState {
    GameState {
        players: Vec::new(),
        current_buyer_index: 0,
        next_buyer_index: 0,
        current_phase: GamePhase::BuyerAssignment,
        current_player_index: 0,
        round: 1,
        draw_pile: Vec::new(),
        discard_pile: Vec::new(),
        winner: None,
        effect: None,
        action_phase_done: Vec::new(),
        selected_seller: None,
        distribution_summary: None,
        perspective: 0,
        rng_seed: 0,
    }
}

/// Apply `action` to `state`, returning the resulting state.
///
/// The input is never modified. Automatic phases (dealing, distribution,
/// trade-ins, winner checks) run as part of the same call until a player has
/// to act or the game is won.
pub fn transition(state: &GameState, action: GameAction) -> Result<GameState, GameError> {
    state.apply(action)
}

/// Trim and validate the names passed to START_GAME
pub fn validate_player_names(names: &[String]) -> Result<Vec<String>, GameError> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&names.len()) {
        return Err(GameError::InvalidPlayerCount(names.len()));
    }

    let mut validated: Vec<String> = Vec::with_capacity(names.len());
    for (i, raw) in names.iter().enumerate() {
        let name = raw.trim();
        if name.is_empty() {
            return Err(GameError::EmptyPlayerName(i));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(GameError::PlayerNameTooLong {
                name: name.to_string(),
                max: MAX_NAME_LENGTH,
            });
        }
        if validated.iter().any(|n| n.to_lowercase() == name.to_lowercase()) {
            return Err(GameError::DuplicatePlayerName(name.to_string()));
        }
        validated.push(name.to_string());
    }

    Ok(validated)
}

impl GameState {
    /// Apply an action, returning the next state
    pub fn apply(&self, action: GameAction) -> Result<GameState, GameError> {
        if self.winner.is_some() {
            return match action {
                GameAction::ChangePerspective { player_index } => {
                    let mut next = self.clone();
                    next.change_perspective(player_index)?;
                    Ok(next)
                }
                _ => Ok(self.clone()),
            };
        }

        let action_type = action.action_type();
        if !is_action_allowed(self.current_phase, action_type) {
            return Err(GameError::ActionNotAllowed {
                action: action_type,
                phase: self.current_phase,
            });
        }

        let mut next = self.clone();
        match next.dispatch(action)? {
            Step::Stay => {}
            Step::EnterPhase => next.settle(),
            Step::CompletePhase => {
                next.advance_phase();
                next.settle();
            }
        }
        Ok(next)
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn is_started(&self) -> bool {
        !self.players.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Total cards across every pile and player zone
    pub fn total_cards(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.players.iter().map(Player::card_count).sum::<usize>()
    }

    /// JSON snapshot for broadcasting to clients, without the RNG seed
    pub fn snapshot(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(fields) = value.as_object_mut() {
            fields.remove("rng_seed");
        }
        Ok(value)
    }

    // ==================== Dispatch ====================

    fn dispatch(&mut self, action: GameAction) -> Result<Step, GameError> {
        match action {
            GameAction::StartGame { player_names, seed } => self.start_game(&player_names, seed),
            GameAction::ResetGame => {
                *self = create_initial_state();
                Ok(Step::Stay)
            }
            GameAction::ChangePerspective { player_index } => {
                self.change_perspective(player_index)?;
                Ok(Step::Stay)
            }
            GameAction::AdvancePhase => {
                self.require_started()?;
                self.require_no_effect()?;
                Ok(Step::CompletePhase)
            }
            GameAction::DealCards => {
                self.require_started()?;
                self.deal_to_hand_size();
                Ok(Step::CompletePhase)
            }
            GameAction::PlaceOffer {
                player_id,
                card_ids,
                face_up_index,
            } => self.place_offer(player_id, &card_ids, face_up_index),
            GameAction::FlipCard {
                buyer_id,
                seller_id,
                card_id,
            } => self.flip_card(buyer_id, seller_id, &card_id),
            GameAction::PlayActionCard { player_id, card_id } => {
                self.play_action_card(player_id, &card_id)
            }
            GameAction::DeclareDone { player_id } => self.declare_done(player_id),
            GameAction::SelectFlipOneCard {
                player_id,
                target_player_id,
                card_id,
            } => self.select_flip_one_card(player_id, target_player_id, &card_id),
            GameAction::SelectAddOneHandCard { player_id, card_id } => {
                self.select_add_one_hand_card(player_id, &card_id)
            }
            GameAction::SelectAddOneOfferTarget {
                player_id,
                target_player_id,
            } => self.select_add_one_offer_target(player_id, target_player_id),
            GameAction::SelectRemoveOneCard {
                player_id,
                target_player_id,
                card_id,
            } => self.select_remove_one_card(player_id, target_player_id, &card_id),
            GameAction::SelectRemoveTwoCard {
                player_id,
                target_player_id,
                card_id,
            } => self.select_remove_two_card(player_id, target_player_id, &card_id),
            GameAction::SelectStealAPointTarget {
                player_id,
                target_player_id,
            } => self.select_steal_a_point_target(player_id, target_player_id),
            GameAction::SelectOffer {
                buyer_id,
                seller_id,
            } => self.select_offer(buyer_id, seller_id),
            GameAction::SelectGotchaCard { player_id, card_id } => {
                self.select_gotcha_card(player_id, &card_id)
            }
            GameAction::SelectGotchaAction { player_id, choice } => {
                self.select_gotcha_action(player_id, choice)
            }
        }
    }

    // ==================== Universal Actions ====================

    fn start_game(
        &mut self,
        player_names: &[String],
        seed: Option<u64>,
    ) -> Result<Step, GameError> {
        let names = validate_player_names(player_names)?;
        let player_count = names.len();

        let seed = seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let draw_pile = shuffle(&build_deck(), &mut rng);
        let buyer = rng.gen_range(0..player_count);

        let players = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let mut player = Player::new(i, name);
                player.has_money = i == buyer;
                player
            })
            .collect();

        info!(players = player_count, buyer, seed, "starting game");

        *self = GameState {
            players,
            current_buyer_index: buyer,
            next_buyer_index: buyer,
            current_phase: GamePhase::BuyerAssignment,
            current_player_index: buyer,
            round: 1,
            draw_pile,
            discard_pile: Vec::new(),
            winner: None,
            effect: None,
            action_phase_done: vec![false; player_count],
            selected_seller: None,
            distribution_summary: None,
            perspective: 0,
            rng_seed: rng.gen(),
        };

        Ok(Step::EnterPhase)
    }

    fn change_perspective(&mut self, player_index: PlayerId) -> Result<(), GameError> {
        self.require_started()?;
        self.require_player(player_index)?;
        self.perspective = player_index;
        Ok(())
    }

    // ==================== Offer Phase ====================

    fn place_offer(
        &mut self,
        player_id: PlayerId,
        card_ids: &[String],
        face_up_index: usize,
    ) -> Result<Step, GameError> {
        self.require_player(player_id)?;
        if player_id == self.current_buyer_index {
            return Err(GameError::BuyerCannotOffer);
        }
        if player_id != self.current_player_index {
            return Err(GameError::NotYourTurn);
        }
        if self.players[player_id].has_offer() {
            return Err(GameError::OfferAlreadyPlaced);
        }
        if card_ids.len() != OFFER_SIZE {
            return Err(GameError::OfferSize(card_ids.len()));
        }
        if face_up_index >= OFFER_SIZE {
            return Err(GameError::FaceUpIndex(face_up_index));
        }
        for (i, id) in card_ids.iter().enumerate() {
            if card_ids[..i].contains(id) {
                return Err(GameError::DuplicateOfferCard(id.clone()));
            }
            if self.players[player_id].hand_card(id).is_none() {
                return Err(GameError::CardNotInHand(id.clone()));
            }
        }

        let player = &mut self.players[player_id];
        let cards: Vec<Card> = card_ids
            .iter()
            .filter_map(|id| player.take_from_hand(id))
            .collect();
        player.offer = cards
            .into_iter()
            .enumerate()
            .map(|(position, card)| OfferCard {
                card,
                face_up: position == face_up_index,
                position,
            })
            .collect();

        debug!(player = player_id, "offer placed");
        Ok(self.advance_to_next_eligible_player(&[]))
    }

    // ==================== Buyer Flip ====================

    fn flip_card(
        &mut self,
        buyer_id: PlayerId,
        seller_id: PlayerId,
        card_id: &str,
    ) -> Result<Step, GameError> {
        self.require_player(buyer_id)?;
        if buyer_id != self.current_buyer_index {
            return Err(GameError::NotBuyer);
        }
        self.flip_offer_card(seller_id, card_id)?;
        Ok(self.advance_to_next_eligible_player(&[buyer_id]))
    }

    // ==================== Action Phase ====================

    fn declare_done(&mut self, player_id: PlayerId) -> Result<Step, GameError> {
        self.require_player(player_id)?;
        self.require_no_effect()?;
        if self.is_done(player_id) {
            return Err(GameError::AlreadyDone);
        }
        if player_id != self.current_player_index {
            return Err(GameError::NotYourTurn);
        }

        self.action_phase_done.resize(self.players.len(), false);
        self.action_phase_done[player_id] = true;
        Ok(self.advance_to_next_eligible_player(&[]))
    }

    // ==================== Offer Selection ====================

    fn select_offer(&mut self, buyer_id: PlayerId, seller_id: PlayerId) -> Result<Step, GameError> {
        self.require_player(buyer_id)?;
        if buyer_id != self.current_buyer_index {
            return Err(GameError::NotBuyer);
        }
        self.require_offer_target(seller_id)?;

        // The money bag moves now; the seller becomes buyer next round
        for player in &mut self.players {
            player.has_money = player.id == seller_id;
        }
        self.next_buyer_index = seller_id;
        self.selected_seller = Some(seller_id);

        debug!(buyer = buyer_id, seller = seller_id, "offer selected");
        Ok(Step::CompletePhase)
    }

    // ==================== Cascade ====================

    fn advance_phase(&mut self) {
        let (phase, round) = next_phase(self.current_phase, self.round);
        self.current_phase = phase;
        self.round = round;
    }

    /// Run automatic phases until a player must act or the game is won
    fn settle(&mut self) {
        let mut remaining = PHASE_ORDER.len();
        loop {
            if self.winner.is_some() {
                return;
            }
            if self.enter_current_phase() == PhaseEntry::AwaitInput {
                return;
            }
            if self.winner.is_some() {
                return;
            }
            if remaining == 0 {
                warn!(
                    phase = ?self.current_phase,
                    round = self.round,
                    "no player can act; stopping cascade"
                );
                return;
            }
            remaining -= 1;
            self.advance_phase();
        }
    }

    fn enter_current_phase(&mut self) -> PhaseEntry {
        debug!(phase = ?self.current_phase, round = self.round, "entering phase");

        match self.current_phase {
            GamePhase::BuyerAssignment => {
                self.assign_buyer();
                PhaseEntry::Continue
            }
            GamePhase::Deal => {
                self.deal_to_hand_size();
                PhaseEntry::Continue
            }
            GamePhase::OfferPhase | GamePhase::BuyerFlip | GamePhase::OfferSelection => {
                self.await_first_eligible()
            }
            GamePhase::ActionPhase => {
                self.action_phase_done = vec![false; self.players.len()];
                self.await_first_eligible()
            }
            GamePhase::OfferDistribution => {
                self.distribute_offers();
                PhaseEntry::Continue
            }
            GamePhase::GotchaTradeins => {
                self.current_player_index = self.current_buyer_index;
                if self.resolve_gotcha_tradeins() {
                    PhaseEntry::AwaitInput
                } else {
                    PhaseEntry::Continue
                }
            }
            GamePhase::ThingTradeins => {
                self.resolve_thing_tradeins();
                PhaseEntry::Continue
            }
            GamePhase::WinnerDetermination => {
                self.determine_winner();
                PhaseEntry::Continue
            }
        }
    }

    fn await_first_eligible(&mut self) -> PhaseEntry {
        match self.first_eligible_player() {
            Some(player) => {
                self.current_player_index = player;
                PhaseEntry::AwaitInput
            }
            None => PhaseEntry::Continue,
        }
    }

    fn assign_buyer(&mut self) {
        let buyer = self.next_buyer_index;
        self.current_buyer_index = buyer;
        self.current_player_index = buyer;
        for player in &mut self.players {
            player.has_money = player.id == buyer;
        }
        self.selected_seller = None;
        self.action_phase_done = vec![false; self.players.len()];
        debug!(buyer, round = self.round, "buyer assigned");
    }

    /// Top every hand up to `HAND_SIZE`, one card at a time from the buyer
    pub(crate) fn deal_to_hand_size(&mut self) {
        let order = rotation_order(self.current_buyer_index, self.players.len(), true);
        loop {
            let mut dealt_any = false;
            for &p in &order {
                if self.players[p].hand.len() >= HAND_SIZE {
                    continue;
                }
                let Some(card) = self.draw_card() else {
                    debug!("out of cards; dealing stopped early");
                    return;
                };
                self.players[p].hand.push(card);
                dealt_any = true;
            }
            if !dealt_any {
                return;
            }
        }
    }

    /// Draw from the pile, reshuffling the discards in when it runs dry
    fn draw_card(&mut self) -> Option<Card> {
        if self.draw_pile.is_empty() && !self.discard_pile.is_empty() {
            let discards = std::mem::take(&mut self.discard_pile);
            self.draw_pile = self.with_rng(|rng| shuffle(&discards, rng));
            debug!(cards = self.draw_pile.len(), "discard pile reshuffled into draw pile");
        }
        self.draw_pile.pop()
    }

    fn distribute_offers(&mut self) {
        let buyer = self.current_buyer_index;
        let mut transfers = Vec::new();

        for seller in 0..self.players.len() {
            if !self.players[seller].has_offer() {
                continue;
            }
            let cards = self.players[seller].clear_offer();
            let recipient = if self.selected_seller == Some(seller) {
                buyer
            } else {
                seller
            };
            transfers.push(OfferTransfer {
                seller_index: seller,
                recipient_index: recipient,
                card_ids: cards.iter().map(|c| c.id.clone()).collect(),
            });
            self.players[recipient].collection.extend(cards);
        }

        self.distribution_summary = Some(DistributionSummary {
            round: self.round,
            buyer_index: buyer,
            chosen_seller: self.selected_seller,
            transfers,
        });
    }

    fn determine_winner(&mut self) {
        let Some(top) = self.players.iter().map(|p| p.points).max() else {
            return;
        };
        if top < POINTS_TO_WIN {
            return;
        }

        let mut leaders = self.players.iter().filter(|p| p.points == top);
        if let (Some(leader), None) = (leaders.next(), leaders.next()) {
            info!(winner = leader.id, points = top, round = self.round, "game won");
            self.winner = Some(leader.id);
        }
    }

    // ==================== Helper Methods ====================

    /// Run `f` with an RNG seeded from the state, then store the successor seed
    pub(crate) fn with_rng<T>(&mut self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = StdRng::seed_from_u64(self.rng_seed);
        let out = f(&mut rng);
        self.rng_seed = rng.gen();
        out
    }

    pub(crate) fn is_done(&self, player: PlayerId) -> bool {
        self.action_phase_done.get(player).copied().unwrap_or(false)
    }

    pub(crate) fn require_started(&self) -> Result<(), GameError> {
        if self.is_started() {
            Ok(())
        } else {
            Err(GameError::GameNotStarted)
        }
    }

    pub(crate) fn require_player(&self, id: PlayerId) -> Result<(), GameError> {
        if id < self.players.len() {
            Ok(())
        } else {
            Err(GameError::InvalidPlayer(id))
        }
    }

    pub(crate) fn require_no_effect(&self) -> Result<(), GameError> {
        match self.effect {
            Some(_) => Err(GameError::EffectPending),
            None => Ok(()),
        }
    }

    /// A seller whose offer may be targeted
    pub(crate) fn require_offer_target(&self, target: PlayerId) -> Result<(), GameError> {
        self.require_player(target)?;
        if target == self.current_buyer_index {
            return Err(GameError::CannotTargetBuyer);
        }
        if !self.players[target].has_offer() {
            return Err(GameError::NoOffer(target));
        }
        Ok(())
    }

    /// Turn a face-down offer card face up
    pub(crate) fn flip_offer_card(
        &mut self,
        seller: PlayerId,
        card_id: &str,
    ) -> Result<(), GameError> {
        self.require_offer_target(seller)?;
        let card = self.players[seller]
            .offer_card_mut(card_id)
            .ok_or_else(|| GameError::CardNotInOffer {
                player: seller,
                card_id: card_id.to_string(),
            })?;
        if card.face_up {
            return Err(GameError::AlreadyFaceUp(card_id.to_string()));
        }
        card.face_up = true;
        Ok(())
    }

    /// Move an offer card to the discard pile
    pub(crate) fn remove_offer_card(
        &mut self,
        seller: PlayerId,
        card_id: &str,
    ) -> Result<(), GameError> {
        self.require_offer_target(seller)?;
        let card = self.players[seller]
            .take_from_offer(card_id)
            .ok_or_else(|| GameError::CardNotInOffer {
                player: seller,
                card_id: card_id.to_string(),
            })?;
        self.discard_pile.push(card);
        Ok(())
    }

    /// Whether the game still holds exactly one copy of every card
    pub fn cards_conserved(&self) -> bool {
        let mut ids: Vec<&str> = self
            .draw_pile
            .iter()
            .chain(&self.discard_pile)
            .chain(self.players.iter().flat_map(|p| {
                p.hand
                    .iter()
                    .chain(p.collection.iter())
                    .chain(p.offer.iter().map(|o| &o.card))
            }))
            .map(|c| c.id.as_str())
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        total == DECK_SIZE && ids.len() == DECK_SIZE
    }
}
