//! Card catalog and deck factory.
//!
//! This module contains:
//! - The closed set of card kinds (Thing, Gotcha and Action subtypes)
//! - Per-kind catalog data: name, set size, effect text, deck count
//! - The fixed 120-card deck and an RNG-injectable shuffle

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total number of cards in a standard deck
pub const DECK_SIZE: usize = 120;

/// Top-level card category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Thing,
    Gotcha,
    Action,
}

/// Thing subtypes, traded in for points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThingKind {
    Giant,
    Big,
    Medium,
    Tiny,
}

/// Gotcha subtypes, traded in for a penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GotchaKind {
    Once,
    Twice,
    Bad,
}

impl GotchaKind {
    /// Order in which Gotcha sets are resolved during trade-ins
    pub const PRIORITY: [GotchaKind; 3] = [GotchaKind::Bad, GotchaKind::Twice, GotchaKind::Once];
}

/// Action card subtypes, played from a collection during the action phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionCardKind {
    FlipOne,
    AddOne,
    RemoveOne,
    RemoveTwo,
    #[serde(rename = "steal-point")]
    StealAPoint,
}

/// Type and subtype of a card, as one closed sum type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "subtype", rename_all = "lowercase")]
pub enum CardKind {
    Thing(ThingKind),
    Gotcha(GotchaKind),
    Action(ActionCardKind),
}

impl CardKind {
    /// Every kind, in deck-building order
    pub const ALL: [CardKind; 12] = [
        CardKind::Thing(ThingKind::Giant),
        CardKind::Thing(ThingKind::Big),
        CardKind::Thing(ThingKind::Medium),
        CardKind::Thing(ThingKind::Tiny),
        CardKind::Gotcha(GotchaKind::Once),
        CardKind::Gotcha(GotchaKind::Twice),
        CardKind::Gotcha(GotchaKind::Bad),
        CardKind::Action(ActionCardKind::FlipOne),
        CardKind::Action(ActionCardKind::AddOne),
        CardKind::Action(ActionCardKind::RemoveOne),
        CardKind::Action(ActionCardKind::RemoveTwo),
        CardKind::Action(ActionCardKind::StealAPoint),
    ];

    pub fn card_type(&self) -> CardType {
        match self {
            CardKind::Thing(_) => CardType::Thing,
            CardKind::Gotcha(_) => CardType::Gotcha,
            CardKind::Action(_) => CardType::Action,
        }
    }

    /// Subtype tag used in card ids
    pub fn subtype(&self) -> &'static str {
        match self {
            CardKind::Thing(ThingKind::Giant) => "giant",
            CardKind::Thing(ThingKind::Big) => "big",
            CardKind::Thing(ThingKind::Medium) => "medium",
            CardKind::Thing(ThingKind::Tiny) => "tiny",
            CardKind::Gotcha(GotchaKind::Once) => "once",
            CardKind::Gotcha(GotchaKind::Twice) => "twice",
            CardKind::Gotcha(GotchaKind::Bad) => "bad",
            CardKind::Action(ActionCardKind::FlipOne) => "flip-one",
            CardKind::Action(ActionCardKind::AddOne) => "add-one",
            CardKind::Action(ActionCardKind::RemoveOne) => "remove-one",
            CardKind::Action(ActionCardKind::RemoveTwo) => "remove-two",
            CardKind::Action(ActionCardKind::StealAPoint) => "steal-point",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CardKind::Thing(ThingKind::Giant) => "Giant Thing",
            CardKind::Thing(ThingKind::Big) => "Big Thing",
            CardKind::Thing(ThingKind::Medium) => "Medium Thing",
            CardKind::Thing(ThingKind::Tiny) => "Tiny Thing",
            CardKind::Gotcha(GotchaKind::Once) => "Gotcha Once",
            CardKind::Gotcha(GotchaKind::Twice) => "Gotcha Twice",
            CardKind::Gotcha(GotchaKind::Bad) => "Gotcha Bad",
            CardKind::Action(ActionCardKind::FlipOne) => "Flip One",
            CardKind::Action(ActionCardKind::AddOne) => "Add One",
            CardKind::Action(ActionCardKind::RemoveOne) => "Remove One",
            CardKind::Action(ActionCardKind::RemoveTwo) => "Remove Two",
            CardKind::Action(ActionCardKind::StealAPoint) => "Steal a Point",
        }
    }

    /// Number of same-kind cards that make a complete set
    pub fn set_size(&self) -> usize {
        match self {
            CardKind::Thing(ThingKind::Giant) => 1,
            CardKind::Thing(ThingKind::Big) => 2,
            CardKind::Thing(ThingKind::Medium) => 3,
            CardKind::Thing(ThingKind::Tiny) => 4,
            CardKind::Gotcha(GotchaKind::Once) => 1,
            CardKind::Gotcha(GotchaKind::Twice) => 2,
            CardKind::Gotcha(GotchaKind::Bad) => 3,
            CardKind::Action(_) => 1,
        }
    }

    pub fn effect_text(&self) -> Option<&'static str> {
        let text = match self {
            CardKind::Thing(_) => return None,
            CardKind::Gotcha(GotchaKind::Once) => {
                "The buyer takes or discards one card from your collection."
            }
            CardKind::Gotcha(GotchaKind::Twice) => {
                "The buyer takes or discards two cards from your collection, one at a time."
            }
            CardKind::Gotcha(GotchaKind::Bad) => {
                "Lose 1 point. It goes to the buyer unless you are the buyer."
            }
            CardKind::Action(ActionCardKind::FlipOne) => "Flip one face-down card in any offer.",
            CardKind::Action(ActionCardKind::AddOne) => {
                "Add one card from your hand face down to any offer."
            }
            CardKind::Action(ActionCardKind::RemoveOne) => "Remove one card from any offer.",
            CardKind::Action(ActionCardKind::RemoveTwo) => {
                "Remove two cards from any offers, one at a time."
            }
            CardKind::Action(ActionCardKind::StealAPoint) => {
                "Take 1 point from a player who has more points than you."
            }
        };
        Some(text)
    }

    /// How many cards of this kind the standard deck holds
    pub fn deck_count(&self) -> usize {
        match self {
            CardKind::Thing(ThingKind::Giant) => 4,
            CardKind::Thing(ThingKind::Big) => 16,
            CardKind::Thing(ThingKind::Medium) => 25,
            CardKind::Thing(ThingKind::Tiny) => 20,
            CardKind::Gotcha(GotchaKind::Once) => 10,
            CardKind::Gotcha(GotchaKind::Twice) => 10,
            CardKind::Gotcha(GotchaKind::Bad) => 12,
            CardKind::Action(ActionCardKind::FlipOne) => 5,
            CardKind::Action(ActionCardKind::AddOne) => 6,
            CardKind::Action(ActionCardKind::RemoveOne) => 6,
            CardKind::Action(ActionCardKind::RemoveTwo) => 3,
            CardKind::Action(ActionCardKind::StealAPoint) => 3,
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ActionCardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        CardKind::Action(*self).fmt(f)
    }
}

/// A single physical card
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// Unique, deterministic id such as `tiny-3` or `gotcha-bad-0`
    pub id: String,
    #[serde(flatten)]
    pub kind: CardKind,
    pub name: String,
    pub set_size: usize,
    pub effect: Option<String>,
}

impl Card {
    pub fn card_type(&self) -> CardType {
        self.kind.card_type()
    }

    pub fn is_action(&self) -> bool {
        matches!(self.kind, CardKind::Action(_))
    }
}

/// Create the `index`-th card of a kind
pub fn make_card(kind: CardKind, index: usize) -> Card {
    let id = match kind {
        CardKind::Gotcha(_) => format!("gotcha-{}-{}", kind.subtype(), index),
        _ => format!("{}-{}", kind.subtype(), index),
    };

    Card {
        id,
        kind,
        name: kind.name().to_string(),
        set_size: kind.set_size(),
        effect: kind.effect_text().map(str::to_string),
    }
}

/// Build the standard 120-card deck in catalog order (unshuffled)
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for kind in CardKind::ALL {
        deck.extend((0..kind.deck_count()).map(|index| make_card(kind, index)));
    }
    deck
}

/// Return a uniformly shuffled copy of `cards`, leaving the input untouched
pub fn shuffle<R: Rng + ?Sized>(cards: &[Card], rng: &mut R) -> Vec<Card> {
    let mut shuffled = cards.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn count(deck: &[Card], kind: CardKind) -> usize {
        deck.iter().filter(|c| c.kind == kind).count()
    }

    #[test]
    fn test_deck_size_and_composition() {
        let deck = build_deck();
        assert_eq!(deck.len(), DECK_SIZE);

        assert_eq!(count(&deck, CardKind::Thing(ThingKind::Giant)), 4);
        assert_eq!(count(&deck, CardKind::Thing(ThingKind::Big)), 16);
        assert_eq!(count(&deck, CardKind::Thing(ThingKind::Medium)), 25);
        assert_eq!(count(&deck, CardKind::Thing(ThingKind::Tiny)), 20);
        assert_eq!(count(&deck, CardKind::Gotcha(GotchaKind::Once)), 10);
        assert_eq!(count(&deck, CardKind::Gotcha(GotchaKind::Twice)), 10);
        assert_eq!(count(&deck, CardKind::Gotcha(GotchaKind::Bad)), 12);
        assert_eq!(count(&deck, CardKind::Action(ActionCardKind::FlipOne)), 5);
        assert_eq!(count(&deck, CardKind::Action(ActionCardKind::AddOne)), 6);
        assert_eq!(count(&deck, CardKind::Action(ActionCardKind::RemoveOne)), 6);
        assert_eq!(count(&deck, CardKind::Action(ActionCardKind::RemoveTwo)), 3);
        assert_eq!(count(&deck, CardKind::Action(ActionCardKind::StealAPoint)), 3);

        let by_type = |t: CardType| deck.iter().filter(|c| c.card_type() == t).count();
        assert_eq!(by_type(CardType::Thing), 65);
        assert_eq!(by_type(CardType::Gotcha), 32);
        assert_eq!(by_type(CardType::Action), 23);
    }

    #[test]
    fn test_card_ids_unique() {
        let deck = build_deck();
        let ids: HashSet<&str> = deck.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), deck.len());
    }

    #[test]
    fn test_make_card_ids() {
        assert_eq!(make_card(CardKind::Thing(ThingKind::Tiny), 3).id, "tiny-3");
        assert_eq!(
            make_card(CardKind::Gotcha(GotchaKind::Bad), 0).id,
            "gotcha-bad-0"
        );
        assert_eq!(
            make_card(CardKind::Action(ActionCardKind::StealAPoint), 2).id,
            "steal-point-2"
        );
    }

    #[test]
    fn test_effect_text_only_on_gotcha_and_action() {
        assert!(make_card(CardKind::Thing(ThingKind::Big), 0).effect.is_none());
        assert!(make_card(CardKind::Gotcha(GotchaKind::Once), 0).effect.is_some());
        assert!(make_card(CardKind::Action(ActionCardKind::AddOne), 0)
            .effect
            .is_some());
    }

    #[test]
    fn test_shuffle_is_seeded_and_pure() {
        let deck = build_deck();
        let a = shuffle(&deck, &mut StdRng::seed_from_u64(7));
        let b = shuffle(&deck, &mut StdRng::seed_from_u64(7));

        assert_eq!(a, b);
        assert_eq!(deck, build_deck(), "input must not be reordered");

        let mut sorted_ids: Vec<&str> = a.iter().map(|c| c.id.as_str()).collect();
        let mut original_ids: Vec<&str> = deck.iter().map(|c| c.id.as_str()).collect();
        sorted_ids.sort_unstable();
        original_ids.sort_unstable();
        assert_eq!(sorted_ids, original_ids);
    }

    #[test]
    fn test_kind_serializes_with_type_and_subtype() {
        let json = serde_json::to_value(CardKind::Action(ActionCardKind::StealAPoint)).unwrap();
        assert_eq!(json["type"], "action");
        assert_eq!(json["subtype"], "steal-point");

        let card = make_card(CardKind::Gotcha(GotchaKind::Bad), 2);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["id"], "gotcha-bad-2");
        assert_eq!(json["type"], "gotcha");
        assert_eq!(json["subtype"], "bad");
        assert!(json.get("kind").is_none());

        let back: Card = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);
    }
}
