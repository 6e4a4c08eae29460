//! The ten-phase round cycle and the per-phase action whitelist.

use crate::actions::ActionType;
use serde::{Deserialize, Serialize};

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// The money-bag holder becomes this round's buyer
    BuyerAssignment,
    /// Hands are topped up
    Deal,
    /// Sellers place three-card offers
    OfferPhase,
    /// The buyer reveals one face-down offer card
    BuyerFlip,
    /// Players play action cards from their collections
    ActionPhase,
    /// The buyer picks one offer
    OfferSelection,
    /// Offers move into collections
    OfferDistribution,
    /// Complete Gotcha sets are resolved
    GotchaTradeins,
    /// Complete Thing sets score points
    ThingTradeins,
    /// Check whether someone has won
    WinnerDetermination,
}

/// Phases in cycle order, starting from the beginning of a round
pub const PHASE_ORDER: [GamePhase; 10] = [
    GamePhase::BuyerAssignment,
    GamePhase::Deal,
    GamePhase::OfferPhase,
    GamePhase::BuyerFlip,
    GamePhase::ActionPhase,
    GamePhase::OfferSelection,
    GamePhase::OfferDistribution,
    GamePhase::GotchaTradeins,
    GamePhase::ThingTradeins,
    GamePhase::WinnerDetermination,
];

impl GamePhase {
    /// The phase that follows this one
    pub fn next(self) -> GamePhase {
        match self {
            GamePhase::BuyerAssignment => GamePhase::Deal,
            GamePhase::Deal => GamePhase::OfferPhase,
            GamePhase::OfferPhase => GamePhase::BuyerFlip,
            GamePhase::BuyerFlip => GamePhase::ActionPhase,
            GamePhase::ActionPhase => GamePhase::OfferSelection,
            GamePhase::OfferSelection => GamePhase::OfferDistribution,
            GamePhase::OfferDistribution => GamePhase::GotchaTradeins,
            GamePhase::GotchaTradeins => GamePhase::ThingTradeins,
            GamePhase::ThingTradeins => GamePhase::WinnerDetermination,
            GamePhase::WinnerDetermination => GamePhase::BuyerAssignment,
        }
    }

    /// Phases that never wait on a player's regular turn.
    ///
    /// Gotcha trade-ins can still suspend on an effect the buyer resolves.
    pub fn is_administrative(self) -> bool {
        matches!(
            self,
            GamePhase::BuyerAssignment
                | GamePhase::Deal
                | GamePhase::OfferDistribution
                | GamePhase::GotchaTradeins
                | GamePhase::ThingTradeins
                | GamePhase::WinnerDetermination
        )
    }
}

/// The fixed phase cycle, for UIs rendering a phase track
pub fn get_phase_order() -> &'static [GamePhase] {
    &PHASE_ORDER
}

/// Advance one phase, incrementing the round on the wrap back to buyer assignment
pub fn next_phase(current: GamePhase, round: u32) -> (GamePhase, u32) {
    let next = current.next();
    let round = if next == GamePhase::BuyerAssignment {
        round + 1
    } else {
        round
    };
    (next, round)
}

/// Whether `action` may be submitted during `phase`
pub fn is_action_allowed(phase: GamePhase, action: ActionType) -> bool {
    action.is_universal() || action.home_phase() == Some(phase)
}
