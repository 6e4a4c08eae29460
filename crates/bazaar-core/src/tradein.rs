//! Set trade-ins.
//!
//! Gotcha sets resolve in priority order (bad, twice, once), scanning players
//! clockwise from the buyer. After every resolved set the scan starts over,
//! so a set formed by a stolen card is picked up before the phase ends.
//! Once/Twice sets suspend the scan until the buyer has made their choices.
//!
//! Thing sets are always automatic: one point per complete set.

use crate::actions::GotchaChoice;
use crate::card::{Card, CardType, GotchaKind};
use crate::effects::{EffectState, GotchaEffect, GotchaEffectKind, GotchaStage};
use crate::error::GameError;
use crate::game::{GameState, Step};
use crate::player::PlayerId;
use crate::sets::{find_complete_sets_by_priority_order, split_complete_sets};
use crate::turn::rotation_order;
use tracing::debug;

impl GameState {
    // ==================== Gotcha Trade-ins ====================

    /// Resolve Gotcha sets until none are left or one needs the buyer.
    ///
    /// Returns `true` when resolution is suspended on an effect.
    pub(crate) fn resolve_gotcha_tradeins(&mut self) -> bool {
        while let Some((owner, kind, set)) = self.next_gotcha_set() {
            let ids: Vec<String> = set.iter().map(|c| c.id.clone()).collect();
            let cards = self.players[owner].take_many_from_collection(&ids);
            self.discard_pile.extend(cards);
            debug!(player = owner, kind = ?kind, "gotcha set traded in");

            let suspended = match kind {
                GotchaKind::Bad => {
                    self.apply_gotcha_bad(owner);
                    false
                }
                GotchaKind::Twice => self.open_gotcha_effect(owner, GotchaEffectKind::Twice),
                GotchaKind::Once => self.open_gotcha_effect(owner, GotchaEffectKind::Once),
            };
            if suspended {
                return true;
            }
        }
        false
    }

    /// Highest-priority complete Gotcha set, first in rotation from the buyer
    fn next_gotcha_set(&self) -> Option<(PlayerId, GotchaKind, Vec<Card>)> {
        let order = rotation_order(self.current_buyer_index, self.players.len(), true);
        let found: Vec<_> = order
            .iter()
            .map(|&p| (p, find_complete_sets_by_priority_order(&self.players[p].collection)))
            .collect();

        GotchaKind::PRIORITY.into_iter().find_map(|kind| {
            found.iter().find_map(|(p, sets)| {
                sets.get(kind).first().map(|set| (*p, kind, set.clone()))
            })
        })
    }

    fn apply_gotcha_bad(&mut self, owner: PlayerId) {
        if self.players[owner].points == 0 {
            return;
        }
        self.players[owner].points -= 1;

        let buyer = self.current_buyer_index;
        if owner != buyer {
            self.players[buyer].points += 1;
        }
        debug!(player = owner, buyer, "gotcha bad cost a point");
    }

    fn open_gotcha_effect(&mut self, owner: PlayerId, kind: GotchaEffectKind) -> bool {
        let effect = GotchaEffect {
            kind,
            player_index: self.current_buyer_index,
            affected_player_index: owner,
            cards_to_select: 1,
            selected_cards: Vec::new(),
            twice_iteration: match kind {
                GotchaEffectKind::Twice => Some(1),
                GotchaEffectKind::Once => None,
            },
            stage: GotchaStage::AwaitingCardSelection,
        };
        self.prime_gotcha_selection(effect)
    }

    /// Park `effect` for the buyer, auto-picking a lone card.
    ///
    /// Returns `false` when the affected collection is empty and there is
    /// nothing left to pick.
    fn prime_gotcha_selection(&mut self, mut effect: GotchaEffect) -> bool {
        let collection = &self.players[effect.affected_player_index].collection;
        match collection.as_slice() {
            [] => {
                debug!(player = effect.affected_player_index, "nothing left to take");
                false
            }
            [only] => {
                effect.selected_cards.push(only.id.clone());
                effect.cards_to_select = 0;
                effect.stage = GotchaStage::AwaitingActionChoice;
                self.effect = Some(EffectState::Gotcha(effect));
                true
            }
            _ => {
                self.effect = Some(EffectState::Gotcha(effect));
                true
            }
        }
    }

    fn gotcha_effect(
        &self,
        player_id: PlayerId,
        stage: GotchaStage,
    ) -> Result<GotchaEffect, GameError> {
        let Some(EffectState::Gotcha(effect)) = &self.effect else {
            return Err(GameError::NoMatchingEffect);
        };
        if player_id != effect.player_index {
            return Err(GameError::NotBuyer);
        }
        if effect.stage != stage {
            return Err(GameError::WrongEffectStage);
        }
        Ok(effect.clone())
    }

    pub(crate) fn select_gotcha_card(
        &mut self,
        player_id: PlayerId,
        card_id: &str,
    ) -> Result<Step, GameError> {
        let mut effect = self.gotcha_effect(player_id, GotchaStage::AwaitingCardSelection)?;
        if self.players[effect.affected_player_index]
            .collection_card(card_id)
            .is_none()
        {
            return Err(GameError::CardNotInAffectedCollection(card_id.to_string()));
        }

        effect.selected_cards.push(card_id.to_string());
        effect.cards_to_select = effect.cards_to_select.saturating_sub(1);
        effect.stage = GotchaStage::AwaitingActionChoice;
        self.effect = Some(EffectState::Gotcha(effect));
        Ok(Step::Stay)
    }

    pub(crate) fn select_gotcha_action(
        &mut self,
        player_id: PlayerId,
        choice: GotchaChoice,
    ) -> Result<Step, GameError> {
        let mut effect = self.gotcha_effect(player_id, GotchaStage::AwaitingActionChoice)?;
        let affected = effect.affected_player_index;
        let buyer = effect.player_index;
        if choice == GotchaChoice::Steal && affected == buyer {
            return Err(GameError::StealFromSelf);
        }

        let card_id = effect.pending_card().unwrap_or_default().to_string();
        let card = self.players[affected]
            .take_from_collection(&card_id)
            .ok_or(GameError::CardNotInAffectedCollection(card_id))?;
        debug!(buyer, from = affected, card = %card.id, choice = ?choice, "gotcha card taken");
        match choice {
            GotchaChoice::Steal => self.players[buyer].collection.push(card),
            GotchaChoice::Discard => self.discard_pile.push(card),
        }
        self.effect = None;

        if effect.twice_iteration == Some(1) {
            effect.twice_iteration = Some(2);
            effect.cards_to_select = 1;
            effect.stage = GotchaStage::AwaitingCardSelection;
            if self.prime_gotcha_selection(effect) {
                return Ok(Step::Stay);
            }
        }

        if self.resolve_gotcha_tradeins() {
            Ok(Step::Stay)
        } else {
            Ok(Step::CompletePhase)
        }
    }

    // ==================== Thing Trade-ins ====================

    /// Score every complete Thing set, one point each
    pub(crate) fn resolve_thing_tradeins(&mut self) {
        for p in rotation_order(self.current_buyer_index, self.players.len(), true) {
            let collection = std::mem::take(&mut self.players[p].collection);
            let (sets, leftover) = split_complete_sets(collection, Some(CardType::Thing));
            self.players[p].collection = leftover;
            if sets.is_empty() {
                continue;
            }

            self.players[p].points += sets.len() as u32;
            debug!(player = p, sets = sets.len(), "thing sets traded in");
            self.discard_pile.extend(sets.into_iter().flatten());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::GameAction;
    use crate::card::{make_card, CardKind, ThingKind};
    use crate::game::{create_initial_state, transition};
    use crate::phase::GamePhase;
    use crate::player::Player;
    use pretty_assertions::assert_eq;

    fn gotcha(kind: GotchaKind, i: usize) -> Card {
        make_card(CardKind::Gotcha(kind), i)
    }

    fn thing(kind: ThingKind, i: usize) -> Card {
        make_card(CardKind::Thing(kind), i)
    }

    /// Three players, buyer 0, sitting in the Gotcha trade-in phase
    fn tradein_state() -> GameState {
        let mut state = create_initial_state();
        state.players = (0..3).map(|i| Player::new(i, format!("P{}", i))).collect();
        state.players[0].has_money = true;
        state.current_phase = GamePhase::GotchaTradeins;
        state.action_phase_done = vec![false; 3];
        state
    }

    fn gotcha_effect(state: &GameState) -> &GotchaEffect {
        match &state.effect {
            Some(EffectState::Gotcha(e)) => e,
            other => panic!("expected a gotcha effect, got {:?}", other),
        }
    }

    #[test]
    fn test_gotcha_bad_moves_point_to_buyer() {
        let mut state = tradein_state();
        state.players[1].points = 2;
        state.players[1].collection = (0..3).map(|i| gotcha(GotchaKind::Bad, i)).collect();

        assert!(!state.resolve_gotcha_tradeins());
        assert_eq!(state.players[1].points, 1);
        assert_eq!(state.players[0].points, 1);
        assert!(state.players[1].collection.is_empty());
        assert_eq!(state.discard_pile.len(), 3);
    }

    #[test]
    fn test_gotcha_bad_with_no_points() {
        let mut state = tradein_state();
        state.players[2].collection = (0..3).map(|i| gotcha(GotchaKind::Bad, i)).collect();

        assert!(!state.resolve_gotcha_tradeins());
        assert!(state.players.iter().all(|p| p.points == 0));
        assert!(state.players[2].collection.is_empty());
    }

    #[test]
    fn test_gotcha_bad_for_buyer_is_lost() {
        let mut state = tradein_state();
        state.players[0].points = 3;
        state.players[0].collection = (0..3).map(|i| gotcha(GotchaKind::Bad, i)).collect();

        state.resolve_gotcha_tradeins();
        assert_eq!(state.players[0].points, 2);
        assert_eq!(state.players.iter().map(|p| p.points).sum::<u32>(), 2);
    }

    #[test]
    fn test_bad_resolves_before_once() {
        let mut state = tradein_state();
        state.players[0].points = 0;
        state.players[1].points = 1;
        state.players[1].collection = vec![gotcha(GotchaKind::Once, 0), thing(ThingKind::Big, 0)];
        state.players[2].collection = (0..3).map(|i| gotcha(GotchaKind::Bad, i)).collect();
        state.players[2].points = 1;

        assert!(state.resolve_gotcha_tradeins());
        assert_eq!(state.players[2].points, 0, "bad already applied");
        let effect = gotcha_effect(&state);
        assert_eq!(effect.affected_player_index, 1);
        assert_eq!(effect.kind, GotchaEffectKind::Once);
    }

    #[test]
    fn test_once_with_single_card_is_auto_selected() {
        let mut state = tradein_state();
        state.players[1].collection = vec![gotcha(GotchaKind::Once, 0), thing(ThingKind::Giant, 0)];

        assert!(state.resolve_gotcha_tradeins());
        let effect = gotcha_effect(&state);
        assert_eq!(effect.stage, GotchaStage::AwaitingActionChoice);
        assert_eq!(effect.pending_card(), Some("giant-0"));
        assert_eq!(effect.cards_to_select, 0);
    }

    #[test]
    fn test_once_with_empty_collection_is_skipped() {
        let mut state = tradein_state();
        state.players[1].collection = vec![gotcha(GotchaKind::Once, 0)];

        assert!(!state.resolve_gotcha_tradeins());
        assert!(state.effect.is_none());
        assert_eq!(state.discard_pile.len(), 1);
    }

    #[test]
    fn test_once_steal_then_phase_completes() {
        let mut state = tradein_state();
        state.players[1].collection = vec![
            gotcha(GotchaKind::Once, 0),
            thing(ThingKind::Medium, 0),
            thing(ThingKind::Medium, 1),
        ];
        assert!(state.resolve_gotcha_tradeins());

        let picked = transition(
            &state,
            GameAction::SelectGotchaCard {
                player_id: 0,
                card_id: "medium-1".into(),
            },
        )
        .unwrap();
        assert_eq!(gotcha_effect(&picked).pending_card(), Some("medium-1"));

        let done = transition(
            &picked,
            GameAction::SelectGotchaAction {
                player_id: 0,
                choice: GotchaChoice::Steal,
            },
        )
        .unwrap();
        assert!(done.effect.is_none());
        assert_eq!(done.players[0].collection, vec![thing(ThingKind::Medium, 1)]);
        assert_eq!(done.players[1].collection, vec![thing(ThingKind::Medium, 0)]);
        assert_ne!(done.current_phase, GamePhase::GotchaTradeins);
    }

    #[test]
    fn test_gotcha_selection_validation() {
        let mut state = tradein_state();
        state.players[1].collection = vec![
            gotcha(GotchaKind::Once, 0),
            thing(ThingKind::Tiny, 0),
            thing(ThingKind::Tiny, 1),
        ];
        state.players[2].collection = vec![thing(ThingKind::Tiny, 2)];
        state.resolve_gotcha_tradeins();

        let select = |player, card: &str| GameAction::SelectGotchaCard {
            player_id: player,
            card_id: card.into(),
        };
        assert_eq!(transition(&state, select(1, "tiny-0")), Err(GameError::NotBuyer));
        assert_eq!(
            transition(&state, select(0, "tiny-2")),
            Err(GameError::CardNotInAffectedCollection("tiny-2".into()))
        );
        assert_eq!(
            transition(
                &state,
                GameAction::SelectGotchaAction {
                    player_id: 0,
                    choice: GotchaChoice::Discard,
                }
            ),
            Err(GameError::WrongEffectStage)
        );
    }

    #[test]
    fn test_buyer_cannot_steal_from_self() {
        let mut state = tradein_state();
        state.players[0].collection = vec![gotcha(GotchaKind::Once, 0), thing(ThingKind::Big, 0)];
        assert!(state.resolve_gotcha_tradeins());

        let steal = GameAction::SelectGotchaAction {
            player_id: 0,
            choice: GotchaChoice::Steal,
        };
        assert_eq!(transition(&state, steal), Err(GameError::StealFromSelf));

        let discarded = transition(
            &state,
            GameAction::SelectGotchaAction {
                player_id: 0,
                choice: GotchaChoice::Discard,
            },
        )
        .unwrap();
        assert!(discarded.effect.is_none());
    }

    #[test]
    fn test_twice_runs_two_iterations() {
        let mut state = tradein_state();
        state.players[2].collection = vec![
            gotcha(GotchaKind::Twice, 0),
            gotcha(GotchaKind::Twice, 1),
            thing(ThingKind::Big, 0),
            thing(ThingKind::Big, 1),
            thing(ThingKind::Tiny, 0),
        ];
        assert!(state.resolve_gotcha_tradeins());
        assert_eq!(gotcha_effect(&state).twice_iteration, Some(1));

        let pick = |s: &GameState, card: &str| {
            transition(
                s,
                GameAction::SelectGotchaCard {
                    player_id: 0,
                    card_id: card.into(),
                },
            )
            .unwrap()
        };
        let discard = |s: &GameState| {
            transition(
                s,
                GameAction::SelectGotchaAction {
                    player_id: 0,
                    choice: GotchaChoice::Discard,
                },
            )
            .unwrap()
        };

        let first = discard(&pick(&state, "big-0"));
        let effect = gotcha_effect(&first);
        assert_eq!(effect.twice_iteration, Some(2));
        assert_eq!(effect.stage, GotchaStage::AwaitingCardSelection);
        assert_eq!(effect.cards_to_select, 1);
        assert_eq!(effect.selected_cards, vec!["big-0".to_string()]);
        assert_eq!(first.current_phase, GamePhase::GotchaTradeins);

        let second = discard(&pick(&first, "tiny-0"));
        assert!(second.effect.is_none());
        assert_eq!(second.players[2].collection, vec![thing(ThingKind::Big, 1)]);
    }

    #[test]
    fn test_thing_tradeins_score_per_set() {
        let mut state = tradein_state();
        state.current_phase = GamePhase::ThingTradeins;
        state.players[1].collection = vec![
            thing(ThingKind::Giant, 0),
            thing(ThingKind::Big, 0),
            gotcha(GotchaKind::Once, 0),
            thing(ThingKind::Big, 1),
            thing(ThingKind::Tiny, 0),
        ];

        state.resolve_thing_tradeins();
        assert_eq!(state.players[1].points, 2);
        assert_eq!(
            state.players[1].collection,
            vec![gotcha(GotchaKind::Once, 0), thing(ThingKind::Tiny, 0)]
        );
        assert_eq!(state.discard_pile.len(), 3);
    }
}
