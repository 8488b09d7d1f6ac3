//! Development cards: the shared shuffled supply and per-player hands.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cards in a fresh deck
pub const DECK_SIZE: usize = 25;

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DevelopmentCard {
    /// Move robber and steal, counts toward Largest Army
    Knight,
    /// Build 2 roads for free
    RoadBuilding,
    /// Take any 2 resources from the bank
    YearOfPlenty,
    /// All players must give you all of one resource type
    Monopoly,
    /// Worth 1 VP, hidden until revealed
    VictoryPoint,
}

impl DevelopmentCard {
    pub const ALL: [DevelopmentCard; 5] = [
        DevelopmentCard::Knight,
        DevelopmentCard::RoadBuilding,
        DevelopmentCard::YearOfPlenty,
        DevelopmentCard::Monopoly,
        DevelopmentCard::VictoryPoint,
    ];

    /// Wire name, as used in `cardType`
    pub fn name(&self) -> &'static str {
        match self {
            DevelopmentCard::Knight => "knight",
            DevelopmentCard::RoadBuilding => "roadBuilding",
            DevelopmentCard::YearOfPlenty => "yearOfPlenty",
            DevelopmentCard::Monopoly => "monopoly",
            DevelopmentCard::VictoryPoint => "victoryPoint",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|card| card.name() == name)
    }

    /// How many of this card a fresh deck holds
    pub fn copies_in_deck(&self) -> usize {
        match self {
            DevelopmentCard::Knight => 14,
            DevelopmentCard::VictoryPoint => 5,
            _ => 2,
        }
    }
}

impl fmt::Display for DevelopmentCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The face-down supply. Cards are drawn from the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentDeck {
    cards: Vec<DevelopmentCard>,
}

impl DevelopmentDeck {
    /// A full deck in a uniformly random order
    pub fn shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for card in DevelopmentCard::ALL {
            cards.extend(std::iter::repeat(card).take(card.copies_in_deck()));
        }
        cards.shuffle(rng);
        Self { cards }
    }

    pub fn draw(&mut self) -> Option<DevelopmentCard> {
        self.cards.pop()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Card counts by type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevCardHand {
    pub knight: u32,
    pub road_building: u32,
    pub year_of_plenty: u32,
    pub monopoly: u32,
    pub victory_point: u32,
}

impl DevCardHand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, card: DevelopmentCard) -> u32 {
        match card {
            DevelopmentCard::Knight => self.knight,
            DevelopmentCard::RoadBuilding => self.road_building,
            DevelopmentCard::YearOfPlenty => self.year_of_plenty,
            DevelopmentCard::Monopoly => self.monopoly,
            DevelopmentCard::VictoryPoint => self.victory_point,
        }
    }

    fn slot(&mut self, card: DevelopmentCard) -> &mut u32 {
        match card {
            DevelopmentCard::Knight => &mut self.knight,
            DevelopmentCard::RoadBuilding => &mut self.road_building,
            DevelopmentCard::YearOfPlenty => &mut self.year_of_plenty,
            DevelopmentCard::Monopoly => &mut self.monopoly,
            DevelopmentCard::VictoryPoint => &mut self.victory_point,
        }
    }

    pub fn add(&mut self, card: DevelopmentCard) {
        *self.slot(card) += 1;
    }

    /// Remove one card (panics if none is held)
    pub fn remove(&mut self, card: DevelopmentCard) {
        let slot = self.slot(card);
        assert!(*slot > 0, "no {} card to remove", card);
        *slot -= 1;
    }

    /// Move every card from `other` into this hand
    pub fn absorb(&mut self, other: &mut DevCardHand) {
        for card in DevelopmentCard::ALL {
            *self.slot(card) += other.count(card);
        }
        *other = DevCardHand::default();
    }

    pub fn total(&self) -> u32 {
        DevelopmentCard::ALL.iter().map(|c| self.count(*c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_deck_composition() {
        let mut deck = DevelopmentDeck::shuffled(&mut StdRng::seed_from_u64(1));
        assert_eq!(deck.len(), DECK_SIZE);

        let mut counts = DevCardHand::new();
        while let Some(card) = deck.draw() {
            counts.add(card);
        }
        assert_eq!(counts.knight, 14);
        assert_eq!(counts.victory_point, 5);
        assert_eq!(counts.road_building, 2);
        assert_eq!(counts.year_of_plenty, 2);
        assert_eq!(counts.monopoly, 2);
        assert!(deck.is_empty());
        assert_eq!(deck.draw(), None);
    }

    #[test]
    fn test_shuffle_uses_injected_rng() {
        let a = DevelopmentDeck::shuffled(&mut StdRng::seed_from_u64(11));
        let b = DevelopmentDeck::shuffled(&mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
        let differs = (12..20).any(|s| DevelopmentDeck::shuffled(&mut StdRng::seed_from_u64(s)) != a);
        assert!(differs);
    }

    #[test]
    fn test_hand_add_remove_absorb() {
        let mut hand = DevCardHand::new();
        let mut fresh = DevCardHand::new();
        fresh.add(DevelopmentCard::Monopoly);
        fresh.add(DevelopmentCard::Knight);
        hand.add(DevelopmentCard::Knight);

        hand.absorb(&mut fresh);
        assert_eq!(hand.knight, 2);
        assert_eq!(hand.monopoly, 1);
        assert_eq!(fresh.total(), 0);

        hand.remove(DevelopmentCard::Knight);
        assert_eq!(hand.total(), 2);
    }

    #[test]
    #[should_panic]
    fn test_remove_missing_card_panics() {
        DevCardHand::new().remove(DevelopmentCard::YearOfPlenty);
    }

    #[test]
    fn test_card_names() {
        for card in DevelopmentCard::ALL {
            assert_eq!(DevelopmentCard::from_name(card.name()), Some(card));
            assert_eq!(serde_json::to_value(card).unwrap(), card.name());
        }
        assert_eq!(DevelopmentCard::from_name("wizard"), None);
    }
}
