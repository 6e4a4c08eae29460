//! Enumerating the actions a player can legally submit.
//!
//! Used by UIs to enable controls and by tests to drive random games.

use crate::actions::{GameAction, GotchaChoice};
use crate::effects::{AddOneStage, EffectState, GotchaStage};
use crate::game::{GameState, OFFER_SIZE};
use crate::phase::GamePhase;
use crate::player::PlayerId;

impl GameState {
    /// The player the game is waiting on, if anyone
    pub fn current_actor(&self) -> Option<PlayerId> {
        if !self.is_started() || self.winner.is_some() {
            return None;
        }
        match &self.effect {
            Some(effect) => Some(effect.actor()),
            None if self.current_phase.is_administrative() => None,
            None => Some(self.current_player_index),
        }
    }

    /// Get all actions `player` could submit right now that would be accepted
    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        if self.winner.is_some() || self.get_player(player).is_none() {
            return Vec::new();
        }

        let candidates = match &self.effect {
            Some(effect) if effect.actor() == player => self.effect_candidates(player, effect),
            Some(_) => Vec::new(),
            None => self.phase_candidates(player),
        };

        candidates
            .into_iter()
            .filter(|action| self.apply(action.clone()).is_ok())
            .collect()
    }

    fn phase_candidates(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        if player != self.current_player_index {
            return actions;
        }

        match self.current_phase {
            GamePhase::Deal => actions.push(GameAction::DealCards),

            GamePhase::OfferPhase => {
                let hand = &self.players[player].hand;
                for a in 0..hand.len() {
                    for b in a + 1..hand.len() {
                        for c in b + 1..hand.len() {
                            let card_ids = vec![
                                hand[a].id.clone(),
                                hand[b].id.clone(),
                                hand[c].id.clone(),
                            ];
                            for face_up_index in 0..OFFER_SIZE {
                                actions.push(GameAction::PlaceOffer {
                                    player_id: player,
                                    card_ids: card_ids.clone(),
                                    face_up_index,
                                });
                            }
                        }
                    }
                }
            }

            GamePhase::BuyerFlip => {
                for (seller, card_id) in self.offer_cards(true) {
                    actions.push(GameAction::FlipCard {
                        buyer_id: player,
                        seller_id: seller,
                        card_id,
                    });
                }
            }

            GamePhase::ActionPhase => {
                for card in self.players[player].collection.iter().filter(|c| c.is_action()) {
                    actions.push(GameAction::PlayActionCard {
                        player_id: player,
                        card_id: card.id.clone(),
                    });
                }
                actions.push(GameAction::DeclareDone { player_id: player });
            }

            GamePhase::OfferSelection => {
                for seller in self.players.iter().filter(|p| p.has_offer()) {
                    actions.push(GameAction::SelectOffer {
                        buyer_id: player,
                        seller_id: seller.id,
                    });
                }
            }

            GamePhase::BuyerAssignment
            | GamePhase::OfferDistribution
            | GamePhase::GotchaTradeins
            | GamePhase::ThingTradeins
            | GamePhase::WinnerDetermination => {}
        }

        actions
    }

    fn effect_candidates(&self, player: PlayerId, effect: &EffectState) -> Vec<GameAction> {
        let targets = || self.players.iter().map(|p| p.id).filter(move |&p| p != player);

        match effect {
            EffectState::FlipOne(_) => self
                .offer_cards(true)
                .into_iter()
                .map(|(target, card_id)| GameAction::SelectFlipOneCard {
                    player_id: player,
                    target_player_id: target,
                    card_id,
                })
                .collect(),
            EffectState::AddOne(e) => match e.stage {
                AddOneStage::AwaitingHandCard => self.players[player]
                    .hand
                    .iter()
                    .map(|c| GameAction::SelectAddOneHandCard {
                        player_id: player,
                        card_id: c.id.clone(),
                    })
                    .collect(),
                AddOneStage::AwaitingOfferTarget { .. } => self
                    .players
                    .iter()
                    .filter(|p| p.has_offer())
                    .map(|p| GameAction::SelectAddOneOfferTarget {
                        player_id: player,
                        target_player_id: p.id,
                    })
                    .collect(),
            },
            EffectState::RemoveOne(_) => self
                .offer_cards(false)
                .into_iter()
                .map(|(target, card_id)| GameAction::SelectRemoveOneCard {
                    player_id: player,
                    target_player_id: target,
                    card_id,
                })
                .collect(),
            EffectState::RemoveTwo(_) => self
                .offer_cards(false)
                .into_iter()
                .map(|(target, card_id)| GameAction::SelectRemoveTwoCard {
                    player_id: player,
                    target_player_id: target,
                    card_id,
                })
                .collect(),
            EffectState::StealAPoint(_) => targets()
                .map(|target| GameAction::SelectStealAPointTarget {
                    player_id: player,
                    target_player_id: target,
                })
                .collect(),
            EffectState::Gotcha(e) => match e.stage {
                GotchaStage::AwaitingCardSelection => self.players[e.affected_player_index]
                    .collection
                    .iter()
                    .map(|c| GameAction::SelectGotchaCard {
                        player_id: player,
                        card_id: c.id.clone(),
                    })
                    .collect(),
                GotchaStage::AwaitingActionChoice => [GotchaChoice::Steal, GotchaChoice::Discard]
                    .into_iter()
                    .map(|choice| GameAction::SelectGotchaAction {
                        player_id: player,
                        choice,
                    })
                    .collect(),
            },
        }
    }

    /// (seller, card id) for every offer card, optionally face-down ones only
    fn offer_cards(&self, face_down_only: bool) -> Vec<(PlayerId, String)> {
        self.players
            .iter()
            .flat_map(|p| {
                p.offer
                    .iter()
                    .filter(move |c| !face_down_only || !c.face_up)
                    .map(move |c| (p.id, c.card.id.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::actions::GameAction;
    use crate::game::{create_initial_state, transition};
    use crate::phase::GamePhase;

    #[test]
    fn test_offer_phase_lists_every_split() {
        let state = transition(
            &create_initial_state(),
            GameAction::StartGame {
                player_names: vec!["A".into(), "B".into(), "C".into()],
                seed: Some(21),
            },
        )
        .unwrap();

        let seller = state.current_player_index;
        assert_eq!(state.current_actor(), Some(seller));
        // 10 three-card subsets of a five-card hand, three face-up choices each
        assert_eq!(state.valid_actions(seller).len(), 30);
        assert!(state.valid_actions(state.current_buyer_index).is_empty());
    }

    #[test]
    fn test_no_actor_in_automatic_phases() {
        let mut state = transition(
            &create_initial_state(),
            GameAction::StartGame {
                player_names: vec!["A".into(), "B".into(), "C".into()],
                seed: Some(21),
            },
        )
        .unwrap();

        state.current_phase = GamePhase::ThingTradeins;
        assert_eq!(state.current_actor(), None);
        state.current_phase = GamePhase::BuyerFlip;
        assert_eq!(state.current_actor(), Some(state.current_player_index));
    }

    #[test]
    fn test_nothing_valid_before_start() {
        let state = create_initial_state();
        assert!(state.valid_actions(0).is_empty());
        assert_eq!(state.current_actor(), None);
    }
}
