//! Player state and card zones.
//!
//! This module contains:
//! - Player struct with hand, offer, collection, points and the money bag
//! - OfferCard, a card committed to an offer with its face-up flag

use crate::card::{Card, CardType};
use serde::{Deserialize, Serialize};

/// Player identifier (index into the game's player list)
pub type PlayerId = usize;

/// A card in an offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCard {
    pub card: Card,
    pub face_up: bool,
    /// Slot in the offer (0, 1, 2, then appended slots)
    pub position: usize,
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player ID (equal to the seat index)
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Private hand
    pub hand: Vec<Card>,
    /// Current offer (empty outside of a round's offer window)
    pub offer: Vec<OfferCard>,
    /// Cards won or kept, scored at trade-in
    pub collection: Vec<Card>,
    pub points: u32,
    /// Whether this player holds the money bag
    pub has_money: bool,
}

impl Player {
    /// Create a new player
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::new(),
            offer: Vec::new(),
            collection: Vec::new(),
            points: 0,
            has_money: false,
        }
    }

    pub fn has_offer(&self) -> bool {
        !self.offer.is_empty()
    }

    /// Whether any card in this player's collection is an action card
    pub fn has_action_card(&self) -> bool {
        self.collection.iter().any(|c| c.card_type() == CardType::Action)
    }

    pub fn has_face_down_offer_card(&self) -> bool {
        self.offer.iter().any(|c| !c.face_up)
    }

    /// Total cards held across hand, offer and collection
    pub fn card_count(&self) -> usize {
        self.hand.len() + self.offer.len() + self.collection.len()
    }

    pub fn hand_card(&self, card_id: &str) -> Option<&Card> {
        self.hand.iter().find(|c| c.id == card_id)
    }

    pub fn collection_card(&self, card_id: &str) -> Option<&Card> {
        self.collection.iter().find(|c| c.id == card_id)
    }

    pub fn offer_card(&self, card_id: &str) -> Option<&OfferCard> {
        self.offer.iter().find(|c| c.card.id == card_id)
    }

    pub fn offer_card_mut(&mut self, card_id: &str) -> Option<&mut OfferCard> {
        self.offer.iter_mut().find(|c| c.card.id == card_id)
    }

    /// Remove a card from the hand
    pub fn take_from_hand(&mut self, card_id: &str) -> Option<Card> {
        let pos = self.hand.iter().position(|c| c.id == card_id)?;
        Some(self.hand.remove(pos))
    }

    /// Remove a card from the collection
    pub fn take_from_collection(&mut self, card_id: &str) -> Option<Card> {
        let pos = self.collection.iter().position(|c| c.id == card_id)?;
        Some(self.collection.remove(pos))
    }

    /// Remove a card from the offer
    pub fn take_from_offer(&mut self, card_id: &str) -> Option<Card> {
        let pos = self.offer.iter().position(|c| c.card.id == card_id)?;
        Some(self.offer.remove(pos).card)
    }

    /// Remove every card of `ids` from the collection, in the given order
    pub fn take_many_from_collection(&mut self, ids: &[String]) -> Vec<Card> {
        ids.iter()
            .filter_map(|id| self.take_from_collection(id))
            .collect()
    }

    /// Append a face-down card at the next free offer slot
    pub fn append_to_offer(&mut self, card: Card) {
        let position = self
            .offer
            .iter()
            .map(|c| c.position + 1)
            .max()
            .unwrap_or(0);
        self.offer.push(OfferCard {
            card,
            face_up: false,
            position,
        });
    }

    /// Empty the offer, returning its cards in slot order
    pub fn clear_offer(&mut self) -> Vec<Card> {
        let mut offer = std::mem::take(&mut self.offer);
        offer.sort_by_key(|c| c.position);
        offer.into_iter().map(|c| c.card).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{make_card, ActionCardKind, CardKind, ThingKind};

    fn tiny(i: usize) -> Card {
        make_card(CardKind::Thing(ThingKind::Tiny), i)
    }

    #[test]
    fn test_new_player_is_empty() {
        let player = Player::new(2, "Test".to_string());
        assert_eq!(player.id, 2);
        assert_eq!(player.card_count(), 0);
        assert_eq!(player.points, 0);
        assert!(!player.has_money);
        assert!(!player.has_offer());
    }

    #[test]
    fn test_take_from_hand() {
        let mut player = Player::new(0, "Test".to_string());
        player.hand = vec![tiny(0), tiny(1)];

        assert_eq!(player.take_from_hand("tiny-1"), Some(tiny(1)));
        assert_eq!(player.take_from_hand("tiny-1"), None);
        assert_eq!(player.hand.len(), 1);
    }

    #[test]
    fn test_has_action_card() {
        let mut player = Player::new(0, "Test".to_string());
        player.hand.push(make_card(CardKind::Action(ActionCardKind::FlipOne), 0));
        assert!(!player.has_action_card(), "hand cards do not count");

        player
            .collection
            .push(make_card(CardKind::Action(ActionCardKind::FlipOne), 1));
        assert!(player.has_action_card());
    }

    #[test]
    fn test_append_to_offer_uses_next_position() {
        let mut player = Player::new(0, "Test".to_string());
        for (i, position) in [0, 1, 2].into_iter().enumerate() {
            player.offer.push(OfferCard {
                card: tiny(i),
                face_up: position == 0,
                position,
            });
        }
        player.take_from_offer("tiny-1");

        player.append_to_offer(tiny(9));
        let added = player.offer_card("tiny-9").unwrap();
        assert_eq!(added.position, 3);
        assert!(!added.face_up);
    }

    #[test]
    fn test_clear_offer_returns_slot_order() {
        let mut player = Player::new(0, "Test".to_string());
        player.offer.push(OfferCard {
            card: tiny(5),
            face_up: false,
            position: 2,
        });
        player.offer.push(OfferCard {
            card: tiny(4),
            face_up: true,
            position: 0,
        });

        let cards = player.clear_offer();
        assert_eq!(cards, vec![tiny(4), tiny(5)]);
        assert!(!player.has_offer());
    }
}
