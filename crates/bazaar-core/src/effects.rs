//! Interactive effect state.
//!
//! An effect that needs a follow-up selection parks itself in
//! `GameState::effect`. While it is set, only the matching `SELECT_*` action
//! makes progress and the cascade stays in the current phase.

use crate::card::{ActionCardKind, CardKind};
use crate::error::GameError;
use crate::game::{GameState, Step};
use crate::player::{Player, PlayerId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The single pending effect, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectState {
    Gotcha(GotchaEffect),
    FlipOne(ActionEffect),
    AddOne(AddOneEffect),
    RemoveOne(ActionEffect),
    RemoveTwo(RemoveTwoEffect),
    StealAPoint(ActionEffect),
}

impl EffectState {
    /// The player who has to make the next selection
    pub fn actor(&self) -> PlayerId {
        match self {
            EffectState::Gotcha(e) => e.player_index,
            EffectState::FlipOne(e) | EffectState::RemoveOne(e) | EffectState::StealAPoint(e) => {
                e.player_index
            }
            EffectState::AddOne(e) => e.player_index,
            EffectState::RemoveTwo(e) => e.player_index,
        }
    }
}

/// A single-selection action effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEffect {
    pub player_index: PlayerId,
    /// The action card that was played (already discarded)
    pub card_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOneEffect {
    pub player_index: PlayerId,
    pub card_id: String,
    pub stage: AddOneStage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddOneStage {
    AwaitingHandCard,
    /// The hand card is chosen but stays in hand until a target is picked
    AwaitingOfferTarget { card_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveTwoEffect {
    pub player_index: PlayerId,
    pub card_id: String,
    /// Removals still owed (2, then 1)
    pub cards_to_select: u8,
    pub removed_cards: Vec<String>,
}

/// Which interactive Gotcha is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GotchaEffectKind {
    Once,
    Twice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GotchaStage {
    AwaitingCardSelection,
    AwaitingActionChoice,
}

/// A Gotcha Once/Twice waiting on the buyer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GotchaEffect {
    pub kind: GotchaEffectKind,
    /// The buyer, who makes every choice
    pub player_index: PlayerId,
    /// Owner of the traded-in set, whose collection is picked from
    pub affected_player_index: PlayerId,
    /// Cards still to pick in this iteration
    pub cards_to_select: u8,
    /// Every card picked so far, across iterations
    pub selected_cards: Vec<String>,
    /// 1 or 2 for Gotcha Twice, absent for Gotcha Once
    pub twice_iteration: Option<u8>,
    pub stage: GotchaStage,
}

impl GotchaEffect {
    /// The card waiting on a steal/discard choice
    pub fn pending_card(&self) -> Option<&str> {
        match self.stage {
            GotchaStage::AwaitingActionChoice => self.selected_cards.last().map(String::as_str),
            GotchaStage::AwaitingCardSelection => None,
        }
    }
}

impl GameState {
    // ==================== Playing a card ====================

    pub(crate) fn play_action_card(
        &mut self,
        player_id: PlayerId,
        card_id: &str,
    ) -> Result<Step, GameError> {
        self.require_player(player_id)?;
        self.require_no_effect()?;
        if player_id != self.current_player_index {
            return Err(GameError::NotYourTurn);
        }
        if self.is_done(player_id) {
            return Err(GameError::AlreadyDone);
        }

        let card = self.players[player_id]
            .collection_card(card_id)
            .ok_or_else(|| GameError::CardNotInCollection(card_id.to_string()))?;
        let CardKind::Action(kind) = card.kind else {
            return Err(GameError::NotAnActionCard(card_id.to_string()));
        };
        if !self.action_has_target(player_id, kind) {
            return Err(GameError::NoValidTarget(kind));
        }

        if let Some(card) = self.players[player_id].take_from_collection(card_id) {
            self.discard_pile.push(card);
        }

        let card_id = card_id.to_string();
        let simple = ActionEffect {
            player_index: player_id,
            card_id: card_id.clone(),
        };
        self.effect = Some(match kind {
            ActionCardKind::FlipOne => EffectState::FlipOne(simple),
            ActionCardKind::RemoveOne => EffectState::RemoveOne(simple),
            ActionCardKind::StealAPoint => EffectState::StealAPoint(simple),
            ActionCardKind::AddOne => EffectState::AddOne(AddOneEffect {
                player_index: player_id,
                card_id,
                stage: AddOneStage::AwaitingHandCard,
            }),
            ActionCardKind::RemoveTwo => EffectState::RemoveTwo(RemoveTwoEffect {
                player_index: player_id,
                card_id,
                cards_to_select: 2,
                removed_cards: Vec::new(),
            }),
        });

        debug!(player = player_id, card = %kind, "action card played");
        Ok(Step::Stay)
    }

    /// Whether playing `kind` right now could be resolved at all
    pub fn action_has_target(&self, player_id: PlayerId, kind: ActionCardKind) -> bool {
        let Some(me) = self.players.get(player_id) else {
            return false;
        };
        let buyer = self.current_buyer_index;
        let sellers = || self.players.iter().filter(move |p| p.id != buyer);

        match kind {
            ActionCardKind::FlipOne => sellers().any(Player::has_face_down_offer_card),
            ActionCardKind::AddOne => !me.hand.is_empty() && sellers().any(Player::has_offer),
            ActionCardKind::RemoveOne => sellers().any(Player::has_offer),
            ActionCardKind::RemoveTwo => sellers().map(|p| p.offer.len()).sum::<usize>() >= 2,
            ActionCardKind::StealAPoint => self.players.iter().any(|p| p.points > me.points),
        }
    }

    // ==================== Follow-up selections ====================

    pub(crate) fn select_flip_one_card(
        &mut self,
        player_id: PlayerId,
        target: PlayerId,
        card_id: &str,
    ) -> Result<Step, GameError> {
        match &self.effect {
            Some(EffectState::FlipOne(e)) => require_actor(e.player_index, player_id)?,
            _ => return Err(GameError::NoMatchingEffect),
        }
        self.flip_offer_card(target, card_id)?;
        Ok(self.finish_action_effect())
    }

    pub(crate) fn select_add_one_hand_card(
        &mut self,
        player_id: PlayerId,
        card_id: &str,
    ) -> Result<Step, GameError> {
        let Some(EffectState::AddOne(effect)) = self.effect.as_mut() else {
            return Err(GameError::NoMatchingEffect);
        };
        require_actor(effect.player_index, player_id)?;
        if effect.stage != AddOneStage::AwaitingHandCard {
            return Err(GameError::WrongEffectStage);
        }
        if self.players[player_id].hand_card(card_id).is_none() {
            return Err(GameError::CardNotInHand(card_id.to_string()));
        }

        effect.stage = AddOneStage::AwaitingOfferTarget {
            card_id: card_id.to_string(),
        };
        Ok(Step::Stay)
    }

    pub(crate) fn select_add_one_offer_target(
        &mut self,
        player_id: PlayerId,
        target: PlayerId,
    ) -> Result<Step, GameError> {
        let card_id = match &self.effect {
            Some(EffectState::AddOne(e)) => {
                require_actor(e.player_index, player_id)?;
                match &e.stage {
                    AddOneStage::AwaitingOfferTarget { card_id } => card_id.clone(),
                    AddOneStage::AwaitingHandCard => return Err(GameError::WrongEffectStage),
                }
            }
            _ => return Err(GameError::NoMatchingEffect),
        };
        self.require_offer_target(target)?;

        let card = self.players[player_id]
            .take_from_hand(&card_id)
            .ok_or(GameError::CardNotInHand(card_id))?;
        self.players[target].append_to_offer(card);

        Ok(self.finish_action_effect())
    }

    pub(crate) fn select_remove_one_card(
        &mut self,
        player_id: PlayerId,
        target: PlayerId,
        card_id: &str,
    ) -> Result<Step, GameError> {
        match &self.effect {
            Some(EffectState::RemoveOne(e)) => require_actor(e.player_index, player_id)?,
            _ => return Err(GameError::NoMatchingEffect),
        }
        self.remove_offer_card(target, card_id)?;
        Ok(self.finish_action_effect())
    }

    pub(crate) fn select_remove_two_card(
        &mut self,
        player_id: PlayerId,
        target: PlayerId,
        card_id: &str,
    ) -> Result<Step, GameError> {
        match &self.effect {
            Some(EffectState::RemoveTwo(e)) => require_actor(e.player_index, player_id)?,
            _ => return Err(GameError::NoMatchingEffect),
        }
        self.remove_offer_card(target, card_id)?;

        if let Some(EffectState::RemoveTwo(effect)) = self.effect.as_mut() {
            effect.cards_to_select = effect.cards_to_select.saturating_sub(1);
            effect.removed_cards.push(card_id.to_string());
            if effect.cards_to_select > 0 {
                return Ok(Step::Stay);
            }
        }
        Ok(self.finish_action_effect())
    }

    pub(crate) fn select_steal_a_point_target(
        &mut self,
        player_id: PlayerId,
        target: PlayerId,
    ) -> Result<Step, GameError> {
        match &self.effect {
            Some(EffectState::StealAPoint(e)) => require_actor(e.player_index, player_id)?,
            _ => return Err(GameError::NoMatchingEffect),
        }
        self.require_player(target)?;
        if target == player_id {
            return Err(GameError::SelfTarget);
        }
        if self.players[target].points <= self.players[player_id].points {
            return Err(GameError::TargetNotAhead);
        }

        self.players[target].points -= 1;
        self.players[player_id].points += 1;
        debug!(from = target, to = player_id, "point stolen");

        Ok(self.finish_action_effect())
    }

    /// Clear the effect and rotate to the next player still in the action phase
    fn finish_action_effect(&mut self) -> Step {
        self.effect = None;
        self.advance_to_next_eligible_player(&[])
    }
}

fn require_actor(expected: PlayerId, actual: PlayerId) -> Result<(), GameError> {
    if expected == actual {
        Ok(())
    } else {
        Err(GameError::NotYourTurn)
    }
}
