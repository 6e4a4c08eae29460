//! Turn rotation and eligibility.
//!
//! Rotation is clockwise from the buyer. Who counts as eligible depends on
//! the phase: sellers only during the offer phase, the buyer alone while
//! flipping and selecting, anyone holding action cards during the action
//! phase, and nobody during administrative phases.

use crate::game::{GameState, Step, OFFER_SIZE};
use crate::phase::GamePhase;
use crate::player::{Player, PlayerId};

/// Whether the buyer takes part in the rotation for `phase`
pub fn is_buyer_included(phase: GamePhase) -> bool {
    phase != GamePhase::OfferPhase
}

/// Clockwise seat order for a phase, starting at the buyer or just after them
pub fn rotation_order(buyer: PlayerId, player_count: usize, include_buyer: bool) -> Vec<PlayerId> {
    if player_count == 0 {
        return Vec::new();
    }
    let start = if include_buyer { 0 } else { 1 };
    (start..player_count)
        .map(|offset| (buyer + offset) % player_count)
        .collect()
}

/// Whether `player` has anything to do in `phase`, judged from their own seat
pub fn has_valid_action(player: &Player, phase: GamePhase, is_buyer: bool) -> bool {
    match phase {
        GamePhase::OfferPhase => {
            !is_buyer && !player.has_offer() && player.hand.len() >= OFFER_SIZE
        }
        GamePhase::ActionPhase => player.has_action_card(),
        GamePhase::BuyerFlip | GamePhase::OfferSelection => is_buyer,
        GamePhase::BuyerAssignment
        | GamePhase::Deal
        | GamePhase::OfferDistribution
        | GamePhase::GotchaTradeins
        | GamePhase::ThingTradeins
        | GamePhase::WinnerDetermination => false,
    }
}

/// Walk clockwise after `from` (ending on `from` itself) and return the first
/// eligible player not in `visited`
pub fn next_eligible_player(
    from: PlayerId,
    state: &GameState,
    visited: &[PlayerId],
) -> Option<PlayerId> {
    let count = state.players.len();
    let include_buyer = is_buyer_included(state.current_phase);

    (1..=count)
        .map(|step| (from + step) % count)
        .filter(|&i| include_buyer || i != state.current_buyer_index)
        .find(|&i| !visited.contains(&i) && state.is_player_eligible(i))
}

impl GameState {
    /// Whether player `index` may act in the current phase right now
    pub fn is_player_eligible(&self, index: PlayerId) -> bool {
        let Some(player) = self.players.get(index) else {
            return false;
        };
        let is_buyer = index == self.current_buyer_index;
        if !has_valid_action(player, self.current_phase, is_buyer) {
            return false;
        }

        match self.current_phase {
            GamePhase::ActionPhase => !self.action_phase_done.get(index).copied().unwrap_or(false),
            GamePhase::BuyerFlip => self.players.iter().any(Player::has_face_down_offer_card),
            GamePhase::OfferSelection => self.players.iter().any(Player::has_offer),
            _ => true,
        }
    }

    /// First eligible player in this phase's rotation order
    pub fn first_eligible_player(&self) -> Option<PlayerId> {
        rotation_order(
            self.current_buyer_index,
            self.players.len(),
            is_buyer_included(self.current_phase),
        )
        .into_iter()
        .find(|&i| self.is_player_eligible(i))
    }

    /// Hand the turn to the next eligible player, or report the phase finished
    pub(crate) fn advance_to_next_eligible_player(&mut self, visited: &[PlayerId]) -> Step {
        match next_eligible_player(self.current_player_index, self, visited) {
            Some(next) => {
                self.current_player_index = next;
                Step::Stay
            }
            None => Step::CompletePhase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{make_card, ActionCardKind, CardKind, ThingKind};
    use crate::game::create_initial_state;

    fn state_with_players(count: usize, buyer: PlayerId, phase: GamePhase) -> GameState {
        let mut state = create_initial_state();
        state.players = (0..count)
            .map(|i| Player::new(i, format!("P{}", i)))
            .collect();
        state.current_buyer_index = buyer;
        state.next_buyer_index = buyer;
        state.current_player_index = buyer;
        state.current_phase = phase;
        state.action_phase_done = vec![false; count];
        state
    }

    fn give_hand(player: &mut Player, n: usize) {
        player.hand = (0..n)
            .map(|i| make_card(CardKind::Thing(ThingKind::Tiny), player.id * 10 + i))
            .collect();
    }

    #[test]
    fn test_buyer_excluded_only_from_offers() {
        assert!(!is_buyer_included(GamePhase::OfferPhase));
        assert!(is_buyer_included(GamePhase::ActionPhase));
        assert!(is_buyer_included(GamePhase::BuyerFlip));
        assert!(is_buyer_included(GamePhase::GotchaTradeins));
    }

    #[test]
    fn test_rotation_order() {
        assert_eq!(rotation_order(2, 4, true), vec![2, 3, 0, 1]);
        assert_eq!(rotation_order(2, 4, false), vec![3, 0, 1]);
        assert_eq!(rotation_order(0, 3, false), vec![1, 2]);
        assert!(rotation_order(0, 0, true).is_empty());
    }

    #[test]
    fn test_has_valid_action_offer_phase() {
        let mut player = Player::new(1, "P1".into());
        give_hand(&mut player, 3);
        assert!(has_valid_action(&player, GamePhase::OfferPhase, false));
        assert!(!has_valid_action(&player, GamePhase::OfferPhase, true));

        give_hand(&mut player, 2);
        assert!(!has_valid_action(&player, GamePhase::OfferPhase, false));
    }

    #[test]
    fn test_has_valid_action_admin_phases() {
        let mut player = Player::new(0, "P0".into());
        give_hand(&mut player, 5);
        for phase in [
            GamePhase::Deal,
            GamePhase::GotchaTradeins,
            GamePhase::ThingTradeins,
            GamePhase::WinnerDetermination,
        ] {
            assert!(!has_valid_action(&player, phase, true));
        }
    }

    #[test]
    fn test_next_eligible_skips_buyer_in_offer_phase() {
        let mut state = state_with_players(4, 1, GamePhase::OfferPhase);
        for p in &mut state.players {
            give_hand(p, 5);
        }

        assert_eq!(state.first_eligible_player(), Some(2));
        assert_eq!(next_eligible_player(3, &state, &[]), Some(0));
        assert_eq!(next_eligible_player(0, &state, &[]), Some(2));
        assert_eq!(next_eligible_player(0, &state, &[2, 3]), Some(0));
        assert_eq!(next_eligible_player(0, &state, &[0, 2, 3]), None);
    }

    #[test]
    fn test_action_phase_respects_done_flags() {
        let mut state = state_with_players(3, 0, GamePhase::ActionPhase);
        for p in &mut state.players {
            p.collection
                .push(make_card(CardKind::Action(ActionCardKind::FlipOne), p.id));
        }

        assert_eq!(state.first_eligible_player(), Some(0));
        state.action_phase_done[1] = true;
        assert_eq!(next_eligible_player(0, &state, &[]), Some(2));
        state.action_phase_done[2] = true;
        assert_eq!(next_eligible_player(0, &state, &[]), Some(0), "wraps to self");
        state.action_phase_done[0] = true;
        assert_eq!(next_eligible_player(0, &state, &[]), None);
    }

    #[test]
    fn test_advance_completes_phase_when_nobody_left() {
        let mut state = state_with_players(3, 0, GamePhase::BuyerFlip);
        assert_eq!(
            state.advance_to_next_eligible_player(&[0]),
            Step::CompletePhase
        );
    }
}
