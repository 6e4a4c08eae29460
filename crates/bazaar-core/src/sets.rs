//! Complete-set identification.

use crate::card::{Card, CardKind, CardType, GotchaKind};

/// Split `cards` into complete same-kind sets and the leftover cards.
///
/// Cards are grouped by kind in encounter order and each group is greedily
/// sliced into chunks of the kind's set size. Leftovers keep their original
/// relative order.
pub fn split_complete_sets(
    cards: Vec<Card>,
    type_filter: Option<CardType>,
) -> (Vec<Vec<Card>>, Vec<Card>) {
    let mut groups: Vec<(CardKind, Vec<usize>)> = Vec::new();
    for (i, card) in cards.iter().enumerate() {
        if type_filter.is_some_and(|t| card.card_type() != t) {
            continue;
        }
        match groups.iter_mut().find(|(kind, _)| *kind == card.kind) {
            Some((_, indices)) => indices.push(i),
            None => groups.push((card.kind, vec![i])),
        }
    }

    // Map each card index to the set it lands in
    let mut owner: Vec<Option<usize>> = vec![None; cards.len()];
    let mut set_count = 0;
    for (kind, indices) in &groups {
        for chunk in indices.chunks_exact(kind.set_size()) {
            for &i in chunk {
                owner[i] = Some(set_count);
            }
            set_count += 1;
        }
    }

    let mut sets: Vec<Vec<Card>> = vec![Vec::new(); set_count];
    let mut leftover = Vec::new();
    for (card, slot) in cards.into_iter().zip(owner) {
        match slot {
            Some(set) => sets[set].push(card),
            None => leftover.push(card),
        }
    }

    (sets, leftover)
}

/// Find all complete sets in `cards` without consuming them
pub fn find_complete_sets(cards: &[Card], type_filter: Option<CardType>) -> Vec<Vec<Card>> {
    split_complete_sets(cards.to_vec(), type_filter).0
}

/// Complete Gotcha sets bucketed by subtype
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GotchaSets {
    pub bad: Vec<Vec<Card>>,
    pub twice: Vec<Vec<Card>>,
    pub once: Vec<Vec<Card>>,
}

impl GotchaSets {
    pub fn get(&self, kind: GotchaKind) -> &[Vec<Card>] {
        match kind {
            GotchaKind::Bad => &self.bad,
            GotchaKind::Twice => &self.twice,
            GotchaKind::Once => &self.once,
        }
    }
}

/// Find complete Gotcha sets, bucketed for trade-in processing
pub fn find_complete_sets_by_priority_order(cards: &[Card]) -> GotchaSets {
    let mut buckets = GotchaSets::default();
    for set in find_complete_sets(cards, Some(CardType::Gotcha)) {
        match set[0].kind {
            CardKind::Gotcha(GotchaKind::Bad) => buckets.bad.push(set),
            CardKind::Gotcha(GotchaKind::Twice) => buckets.twice.push(set),
            CardKind::Gotcha(GotchaKind::Once) => buckets.once.push(set),
            CardKind::Thing(_) | CardKind::Action(_) => {}
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{make_card, ActionCardKind, ThingKind};

    fn cards(counts: &[(CardKind, usize)]) -> Vec<Card> {
        let mut out = Vec::new();
        let mut next = 0;
        for &(kind, n) in counts {
            for _ in 0..n {
                out.push(make_card(kind, next));
                next += 1;
            }
        }
        out
    }

    const TINY: CardKind = CardKind::Thing(ThingKind::Tiny);
    const BIG: CardKind = CardKind::Thing(ThingKind::Big);
    const GIANT: CardKind = CardKind::Thing(ThingKind::Giant);
    const BAD: CardKind = CardKind::Gotcha(GotchaKind::Bad);
    const ONCE: CardKind = CardKind::Gotcha(GotchaKind::Once);
    const TWICE: CardKind = CardKind::Gotcha(GotchaKind::Twice);

    #[test]
    fn test_greedy_chunking() {
        let hand = cards(&[(BIG, 5), (TINY, 3)]);
        let (sets, leftover) = split_complete_sets(hand, None);

        assert_eq!(sets.len(), 2);
        assert!(sets.iter().all(|s| s.len() == 2 && s[0].kind == BIG));
        assert_eq!(leftover.len(), 4);
    }

    #[test]
    fn test_sets_in_encounter_order() {
        let mut hand = cards(&[(GIANT, 1)]);
        hand.insert(0, make_card(BIG, 90));
        hand.push(make_card(BIG, 91));

        let sets = find_complete_sets(&hand, None);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0][0].kind, BIG);
        assert_eq!(sets[1][0].kind, GIANT);
    }

    #[test]
    fn test_type_filter() {
        let hand = cards(&[(GIANT, 2), (ONCE, 1)]);
        assert_eq!(find_complete_sets(&hand, Some(CardType::Thing)).len(), 2);
        assert_eq!(find_complete_sets(&hand, Some(CardType::Gotcha)).len(), 1);
        assert_eq!(find_complete_sets(&hand, Some(CardType::Action)).len(), 0);
    }

    #[test]
    fn test_leftover_has_no_further_sets() {
        let hand = cards(&[
            (TINY, 9),
            (BIG, 3),
            (BAD, 4),
            (TWICE, 3),
            (CardKind::Action(ActionCardKind::AddOne), 2),
        ]);
        let (sets, leftover) = split_complete_sets(hand, None);
        assert!(!sets.is_empty());
        assert!(find_complete_sets(&leftover, None).is_empty());
    }

    #[test]
    fn test_priority_buckets() {
        let hand = cards(&[(ONCE, 2), (TWICE, 2), (BAD, 3), (GIANT, 1)]);
        let buckets = find_complete_sets_by_priority_order(&hand);

        assert_eq!(buckets.bad.len(), 1);
        assert_eq!(buckets.twice.len(), 1);
        assert_eq!(buckets.once.len(), 2);

        assert_eq!(buckets.get(GotchaKind::Once).len(), 2);
        assert!(buckets.get(GotchaKind::Bad)[0]
            .iter()
            .all(|c| c.kind == BAD));
    }
}
