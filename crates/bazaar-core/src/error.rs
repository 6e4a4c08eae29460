//! Errors returned when an action is rejected.
//!
//! A rejected action never changes the game state.

use crate::actions::ActionType;
use crate::card::ActionCardKind;
use crate::phase::GamePhase;
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category of a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Action not legal in the current phase or state
    Phase,
    /// Bad game setup
    Configuration,
    /// Unknown player or card
    Identifier,
    /// Wrong number of things
    Cardinality,
    /// Legal shape, but the rules forbid it
    BusinessRule,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    // ==================== Phase ====================
    #[error("{action:?} is not allowed during {phase:?}")]
    ActionNotAllowed { action: ActionType, phase: GamePhase },

    #[error("Game has not started")]
    GameNotStarted,

    #[error("Another effect must be resolved first")]
    EffectPending,

    #[error("No matching effect is waiting for this selection")]
    NoMatchingEffect,

    #[error("The effect is not waiting for this selection yet")]
    WrongEffectStage,

    // ==================== Configuration ====================
    #[error("A game needs 3 to 6 players, got {0}")]
    InvalidPlayerCount(usize),

    #[error("Player name at position {0} is empty")]
    EmptyPlayerName(usize),

    #[error("Player name {name:?} is longer than {max} characters")]
    PlayerNameTooLong { name: String, max: usize },

    #[error("Player name {0:?} is used more than once")]
    DuplicatePlayerName(String),

    // ==================== Identifier ====================
    #[error("Player {0} does not exist")]
    InvalidPlayer(PlayerId),

    #[error("Card {0} is not in your hand")]
    CardNotInHand(String),

    #[error("Card {0} is not in your collection")]
    CardNotInCollection(String),

    #[error("Card {card_id} is not in player {player}'s offer")]
    CardNotInOffer { player: PlayerId, card_id: String },

    #[error("Card {0} is not in the affected player's collection")]
    CardNotInAffectedCollection(String),

    // ==================== Cardinality ====================
    #[error("Offer must contain exactly 3 cards, got {0}")]
    OfferSize(usize),

    #[error("Face-up index must be 0, 1, or 2, got {0}")]
    FaceUpIndex(usize),

    #[error("Card {0} appears more than once in the offer")]
    DuplicateOfferCard(String),

    // ==================== Business rules ====================
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Only the buyer can do that")]
    NotBuyer,

    #[error("The buyer cannot make an offer")]
    BuyerCannotOffer,

    #[error("You have already placed an offer")]
    OfferAlreadyPlaced,

    #[error("Player {0} has no offer")]
    NoOffer(PlayerId),

    #[error("The buyer has no offer to target")]
    CannotTargetBuyer,

    #[error("Card {0} is already face up")]
    AlreadyFaceUp(String),

    #[error("Card {0} is not an action card")]
    NotAnActionCard(String),

    #[error("You have already declared done")]
    AlreadyDone,

    #[error("{0} has no valid target right now")]
    NoValidTarget(ActionCardKind),

    #[error("Cannot steal a point from yourself")]
    SelfTarget,

    #[error("Target player must have more points than you")]
    TargetNotAhead,

    #[error("The buyer cannot steal from their own collection")]
    StealFromSelf,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::ActionNotAllowed { .. }
            | GameError::GameNotStarted
            | GameError::EffectPending
            | GameError::NoMatchingEffect
            | GameError::WrongEffectStage => ErrorKind::Phase,

            GameError::InvalidPlayerCount(_)
            | GameError::EmptyPlayerName(_)
            | GameError::PlayerNameTooLong { .. }
            | GameError::DuplicatePlayerName(_) => ErrorKind::Configuration,

            GameError::InvalidPlayer(_)
            | GameError::CardNotInHand(_)
            | GameError::CardNotInCollection(_)
            | GameError::CardNotInOffer { .. }
            | GameError::CardNotInAffectedCollection(_) => ErrorKind::Identifier,

            GameError::OfferSize(_)
            | GameError::FaceUpIndex(_)
            | GameError::DuplicateOfferCard(_) => ErrorKind::Cardinality,

            GameError::NotYourTurn
            | GameError::NotBuyer
            | GameError::BuyerCannotOffer
            | GameError::OfferAlreadyPlaced
            | GameError::NoOffer(_)
            | GameError::CannotTargetBuyer
            | GameError::AlreadyFaceUp(_)
            | GameError::NotAnActionCard(_)
            | GameError::AlreadyDone
            | GameError::NoValidTarget(_)
            | GameError::SelfTarget
            | GameError::TargetNotAhead
            | GameError::StealFromSelf => ErrorKind::BusinessRule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            GameError::OfferSize(2).to_string(),
            "Offer must contain exactly 3 cards, got 2"
        );
        assert!(GameError::FaceUpIndex(3).to_string().contains("0, 1, or 2"));
        assert_eq!(
            GameError::NoValidTarget(ActionCardKind::StealAPoint).to_string(),
            "Steal a Point has no valid target right now"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(GameError::OfferSize(4).kind(), ErrorKind::Cardinality);
        assert_eq!(GameError::InvalidPlayerCount(2).kind(), ErrorKind::Configuration);
        assert_eq!(GameError::InvalidPlayer(9).kind(), ErrorKind::Identifier);
        assert_eq!(GameError::TargetNotAhead.kind(), ErrorKind::BusinessRule);
        assert_eq!(GameError::EffectPending.kind(), ErrorKind::Phase);
    }
}
