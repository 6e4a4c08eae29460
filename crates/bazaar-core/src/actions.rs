//! Game actions that players can take.
//!
//! Actions are a closed set of records tagged by `type`, so a client submits
//! e.g. `{"type": "PLACE_OFFER", "player_id": 1, "card_ids": [...], "face_up_index": 0}`.

use crate::phase::GamePhase;
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};

/// All possible actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameAction {
    // ==================== Universal ====================
    /// Start (or restart) a game with 3-6 players
    StartGame {
        player_names: Vec<String>,
        /// Fixed shuffle seed; drawn from entropy when absent
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Throw the game away and return to the empty initial state
    ResetGame,
    /// Switch which player's view the UI renders
    ChangePerspective { player_index: PlayerId },
    /// Force the current phase to end
    AdvancePhase,

    // ==================== Deal ====================
    /// Deal hands explicitly
    DealCards,

    // ==================== Offer Phase ====================
    /// Commit three hand cards as an offer, one of them face up
    PlaceOffer {
        player_id: PlayerId,
        card_ids: Vec<String>,
        face_up_index: usize,
    },

    // ==================== Buyer Flip ====================
    /// The buyer reveals one face-down offer card
    FlipCard {
        buyer_id: PlayerId,
        seller_id: PlayerId,
        card_id: String,
    },

    // ==================== Action Phase ====================
    /// Play an action card from your collection
    PlayActionCard { player_id: PlayerId, card_id: String },
    /// Stop playing action cards this round
    DeclareDone { player_id: PlayerId },
    /// Flip One: choose the face-down card to reveal
    SelectFlipOneCard {
        player_id: PlayerId,
        target_player_id: PlayerId,
        card_id: String,
    },
    /// Add One: choose the hand card to add
    SelectAddOneHandCard { player_id: PlayerId, card_id: String },
    /// Add One: choose the offer that receives it
    SelectAddOneOfferTarget {
        player_id: PlayerId,
        target_player_id: PlayerId,
    },
    /// Remove One: choose the offer card to remove
    SelectRemoveOneCard {
        player_id: PlayerId,
        target_player_id: PlayerId,
        card_id: String,
    },
    /// Remove Two: choose one of the two offer cards to remove
    SelectRemoveTwoCard {
        player_id: PlayerId,
        target_player_id: PlayerId,
        card_id: String,
    },
    /// Steal a Point: choose who to take the point from
    SelectStealAPointTarget {
        player_id: PlayerId,
        target_player_id: PlayerId,
    },

    // ==================== Offer Selection ====================
    /// The buyer picks a seller's offer
    SelectOffer {
        buyer_id: PlayerId,
        seller_id: PlayerId,
    },

    // ==================== Gotcha Trade-ins ====================
    /// The buyer picks the card a Gotcha takes from the affected collection
    SelectGotchaCard { player_id: PlayerId, card_id: String },
    /// The buyer keeps or discards the picked card
    SelectGotchaAction {
        player_id: PlayerId,
        choice: GotchaChoice,
    },
}

/// What the buyer does with a card taken by a Gotcha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GotchaChoice {
    /// Move it into the buyer's own collection
    Steal,
    /// Put it on the discard pile
    Discard,
}

/// Payload-free discriminant of [`GameAction`], used for phase whitelisting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    StartGame,
    ResetGame,
    ChangePerspective,
    AdvancePhase,
    DealCards,
    PlaceOffer,
    FlipCard,
    PlayActionCard,
    DeclareDone,
    SelectFlipOneCard,
    SelectAddOneHandCard,
    SelectAddOneOfferTarget,
    SelectRemoveOneCard,
    SelectRemoveTwoCard,
    SelectStealAPointTarget,
    SelectOffer,
    SelectGotchaCard,
    SelectGotchaAction,
}

impl ActionType {
    pub const ALL: [ActionType; 18] = [
        ActionType::StartGame,
        ActionType::ResetGame,
        ActionType::ChangePerspective,
        ActionType::AdvancePhase,
        ActionType::DealCards,
        ActionType::PlaceOffer,
        ActionType::FlipCard,
        ActionType::PlayActionCard,
        ActionType::DeclareDone,
        ActionType::SelectFlipOneCard,
        ActionType::SelectAddOneHandCard,
        ActionType::SelectAddOneOfferTarget,
        ActionType::SelectRemoveOneCard,
        ActionType::SelectRemoveTwoCard,
        ActionType::SelectStealAPointTarget,
        ActionType::SelectOffer,
        ActionType::SelectGotchaCard,
        ActionType::SelectGotchaAction,
    ];

    /// The only phase this action is legal in, or `None` for universal actions
    pub fn home_phase(self) -> Option<GamePhase> {
        match self {
            ActionType::StartGame
            | ActionType::ResetGame
            | ActionType::ChangePerspective
            | ActionType::AdvancePhase => None,
            ActionType::DealCards => Some(GamePhase::Deal),
            ActionType::PlaceOffer => Some(GamePhase::OfferPhase),
            ActionType::FlipCard => Some(GamePhase::BuyerFlip),
            ActionType::PlayActionCard
            | ActionType::DeclareDone
            | ActionType::SelectFlipOneCard
            | ActionType::SelectAddOneHandCard
            | ActionType::SelectAddOneOfferTarget
            | ActionType::SelectRemoveOneCard
            | ActionType::SelectRemoveTwoCard
            | ActionType::SelectStealAPointTarget => Some(GamePhase::ActionPhase),
            ActionType::SelectOffer => Some(GamePhase::OfferSelection),
            ActionType::SelectGotchaCard | ActionType::SelectGotchaAction => {
                Some(GamePhase::GotchaTradeins)
            }
        }
    }

    pub fn is_universal(self) -> bool {
        self.home_phase().is_none()
    }
}

impl GameAction {
    pub fn action_type(&self) -> ActionType {
        match self {
            GameAction::StartGame { .. } => ActionType::StartGame,
            GameAction::ResetGame => ActionType::ResetGame,
            GameAction::ChangePerspective { .. } => ActionType::ChangePerspective,
            GameAction::AdvancePhase => ActionType::AdvancePhase,
            GameAction::DealCards => ActionType::DealCards,
            GameAction::PlaceOffer { .. } => ActionType::PlaceOffer,
            GameAction::FlipCard { .. } => ActionType::FlipCard,
            GameAction::PlayActionCard { .. } => ActionType::PlayActionCard,
            GameAction::DeclareDone { .. } => ActionType::DeclareDone,
            GameAction::SelectFlipOneCard { .. } => ActionType::SelectFlipOneCard,
            GameAction::SelectAddOneHandCard { .. } => ActionType::SelectAddOneHandCard,
            GameAction::SelectAddOneOfferTarget { .. } => ActionType::SelectAddOneOfferTarget,
            GameAction::SelectRemoveOneCard { .. } => ActionType::SelectRemoveOneCard,
            GameAction::SelectRemoveTwoCard { .. } => ActionType::SelectRemoveTwoCard,
            GameAction::SelectStealAPointTarget { .. } => ActionType::SelectStealAPointTarget,
            GameAction::SelectOffer { .. } => ActionType::SelectOffer,
            GameAction::SelectGotchaCard { .. } => ActionType::SelectGotchaCard,
            GameAction::SelectGotchaAction { .. } => ActionType::SelectGotchaAction,
        }
    }

    /// The player this action claims to act for, if it names one
    pub fn actor(&self) -> Option<PlayerId> {
        match self {
            GameAction::StartGame { .. }
            | GameAction::ResetGame
            | GameAction::ChangePerspective { .. }
            | GameAction::AdvancePhase
            | GameAction::DealCards => None,
            GameAction::FlipCard { buyer_id, .. } | GameAction::SelectOffer { buyer_id, .. } => {
                Some(*buyer_id)
            }
            GameAction::PlaceOffer { player_id, .. }
            | GameAction::PlayActionCard { player_id, .. }
            | GameAction::DeclareDone { player_id }
            | GameAction::SelectFlipOneCard { player_id, .. }
            | GameAction::SelectAddOneHandCard { player_id, .. }
            | GameAction::SelectAddOneOfferTarget { player_id, .. }
            | GameAction::SelectRemoveOneCard { player_id, .. }
            | GameAction::SelectRemoveTwoCard { player_id, .. }
            | GameAction::SelectStealAPointTarget { player_id, .. }
            | GameAction::SelectGotchaCard { player_id, .. }
            | GameAction::SelectGotchaAction { player_id, .. } => Some(*player_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_json_uses_type_tag() {
        let action: GameAction = serde_json::from_str(
            r#"{"type":"PLACE_OFFER","player_id":1,"card_ids":["a","b","c"],"face_up_index":2}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            GameAction::PlaceOffer {
                player_id: 1,
                card_ids: vec!["a".into(), "b".into(), "c".into()],
                face_up_index: 2,
            }
        );

        let json = serde_json::to_value(GameAction::AdvancePhase).unwrap();
        assert_eq!(json["type"], "ADVANCE_PHASE");
    }

    #[test]
    fn test_start_game_seed_is_optional() {
        let action: GameAction =
            serde_json::from_str(r#"{"type":"START_GAME","player_names":["A","B","C"]}"#).unwrap();
        assert!(matches!(action, GameAction::StartGame { seed: None, .. }));
    }

    #[test]
    fn test_gotcha_choice_tags() {
        let action: GameAction = serde_json::from_str(
            r#"{"type":"SELECT_GOTCHA_ACTION","player_id":0,"choice":"steal"}"#,
        )
        .unwrap();
        assert_eq!(action.action_type(), ActionType::SelectGotchaAction);
        assert_eq!(action.actor(), Some(0));
    }

    #[test]
    fn test_universal_actions_have_no_actor() {
        assert_eq!(GameAction::ResetGame.actor(), None);
        assert!(ActionType::ResetGame.is_universal());
        assert!(!ActionType::DeclareDone.is_universal());
    }
}
