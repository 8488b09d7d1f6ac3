//! Player state: hand, development cards, score and remaining pieces.

use crate::board::PlayerId;
use crate::deck::{DevCardHand, DevelopmentCard};
use crate::game::CreateGameError;
use crate::resources::ResourceHand;
use serde::{Deserialize, Serialize};

/// Pieces each player starts with
pub const SETTLEMENT_PIECES: u32 = 5;
pub const CITY_PIECES: u32 = 4;
pub const ROAD_PIECES: u32 = 15;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// Player color for UI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerColor {
    Red,
    Blue,
    Orange,
    White,
}

impl PlayerColor {
    /// The palette, in assignment order
    pub const PALETTE: [PlayerColor; 4] = [
        PlayerColor::Red,
        PlayerColor::Blue,
        PlayerColor::Orange,
        PlayerColor::White,
    ];

    /// Get hex color code for rendering
    pub fn hex_code(&self) -> u32 {
        match self {
            PlayerColor::Red => 0xE74C3C,
            PlayerColor::Blue => 0x3498DB,
            PlayerColor::Orange => 0xE67E22,
            PlayerColor::White => 0xECF0F1,
        }
    }
}

/// One entry of the roster supplied at game creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeat {
    pub name: String,
    #[serde(default)]
    pub color: Option<PlayerColor>,
}

impl PlayerSeat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }

    pub fn with_color(name: impl Into<String>, color: PlayerColor) -> Self {
        Self {
            name: name.into(),
            color: Some(color),
        }
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Seat index (0-3)
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub resources: ResourceHand,
    /// Development cards that may be played this turn
    pub dev_cards: DevCardHand,
    /// Development cards bought this turn (can't be played same turn)
    pub bought_this_turn: DevCardHand,
    /// Number of knights played (for Largest Army)
    pub played_knights: u32,
    /// Victory point cards turned face up
    pub revealed_victory_cards: u32,
    /// Public score: buildings, revealed cards and bonuses
    pub victory_points: u32,
    pub settlements_remaining: u32,
    pub cities_remaining: u32,
    pub roads_remaining: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String, color: PlayerColor) -> Self {
        Self {
            id,
            name,
            color,
            resources: ResourceHand::new(),
            dev_cards: DevCardHand::new(),
            bought_this_turn: DevCardHand::new(),
            played_knights: 0,
            revealed_victory_cards: 0,
            victory_points: 0,
            settlements_remaining: SETTLEMENT_PIECES,
            cities_remaining: CITY_PIECES,
            roads_remaining: ROAD_PIECES,
        }
    }

    /// Victory point cards still face down (including ones bought this turn)
    pub fn hidden_victory_points(&self) -> u32 {
        self.dev_cards.count(DevelopmentCard::VictoryPoint)
            + self.bought_this_turn.count(DevelopmentCard::VictoryPoint)
    }

    /// Score used for win detection
    pub fn total_victory_points(&self) -> u32 {
        self.victory_points + self.hidden_victory_points()
    }

    /// Development cards held, playable or not
    pub fn dev_card_count(&self) -> u32 {
        self.dev_cards.total() + self.bought_this_turn.total()
    }

    /// Cards bought this turn become playable
    pub fn start_new_turn(&mut self) {
        self.dev_cards.absorb(&mut self.bought_this_turn);
    }

    /// Turn every hidden victory point card face up
    pub fn reveal_victory_cards(&mut self) -> u32 {
        let hidden = self.hidden_victory_points();
        self.dev_cards.victory_point = 0;
        self.bought_this_turn.victory_point = 0;
        self.revealed_victory_cards += hidden;
        self.victory_points += hidden;
        hidden
    }
}

/// Turn a roster into seated players, resolving colors.
///
/// A requested color is honored for the first seat asking for it; later seats
/// and seats without a request get the first free palette color.
pub fn seat_players(seats: &[PlayerSeat]) -> Result<Vec<Player>, CreateGameError> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&seats.len()) {
        return Err(CreateGameError::PlayerCount(seats.len()));
    }
    if let Some(seat) = seats.iter().position(|s| s.name.trim().is_empty()) {
        return Err(CreateGameError::EmptyName(seat));
    }

    let mut taken: Vec<PlayerColor> = Vec::with_capacity(seats.len());
    let mut requested: Vec<Option<PlayerColor>> = Vec::with_capacity(seats.len());
    for seat in seats {
        match seat.color {
            Some(color) if !taken.contains(&color) => {
                taken.push(color);
                requested.push(Some(color));
            }
            _ => requested.push(None),
        }
    }

    let mut players = Vec::with_capacity(seats.len());
    for (i, (seat, color)) in seats.iter().zip(requested).enumerate() {
        let color = match color {
            Some(color) => color,
            None => {
                let free = PlayerColor::PALETTE
                    .into_iter()
                    .find(|c| !taken.contains(c))
                    .ok_or(CreateGameError::PlayerCount(seats.len()))?;
                taken.push(free);
                free
            }
        };
        players.push(Player::new(i as PlayerId, seat.name.clone(), color));
    }
    Ok(players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_player_pieces() {
        let player = Player::new(0, "Ah Kow".into(), PlayerColor::Red);
        assert_eq!(player.settlements_remaining, 5);
        assert_eq!(player.cities_remaining, 4);
        assert_eq!(player.roads_remaining, 15);
        assert_eq!(player.total_victory_points(), 0);
    }

    #[test]
    fn test_hidden_victory_points() {
        let mut player = Player::new(1, "Mei".into(), PlayerColor::Blue);
        player.victory_points = 4;
        player.dev_cards.add(DevelopmentCard::VictoryPoint);
        player.bought_this_turn.add(DevelopmentCard::VictoryPoint);
        player.bought_this_turn.add(DevelopmentCard::Knight);

        assert_eq!(player.hidden_victory_points(), 2);
        assert_eq!(player.total_victory_points(), 6);
        assert_eq!(player.dev_card_count(), 3);

        assert_eq!(player.reveal_victory_cards(), 2);
        assert_eq!(player.victory_points, 6);
        assert_eq!(player.revealed_victory_cards, 2);
        assert_eq!(player.hidden_victory_points(), 0);
        assert_eq!(player.bought_this_turn.knight, 1);
    }

    #[test]
    fn test_start_new_turn_makes_cards_playable() {
        let mut player = Player::new(0, "Siti".into(), PlayerColor::Orange);
        player.bought_this_turn.add(DevelopmentCard::Monopoly);
        player.start_new_turn();
        assert_eq!(player.dev_cards.monopoly, 1);
        assert_eq!(player.bought_this_turn.total(), 0);
    }

    #[test]
    fn test_seat_players_resolves_colors() {
        let players = seat_players(&[
            PlayerSeat::with_color("a", PlayerColor::White),
            PlayerSeat::new("b"),
            PlayerSeat::with_color("c", PlayerColor::White),
        ])
        .unwrap();
        let colors: Vec<PlayerColor> = players.iter().map(|p| p.color).collect();
        assert_eq!(
            colors,
            vec![PlayerColor::White, PlayerColor::Red, PlayerColor::Blue]
        );
        assert_eq!(players[2].id, 2);
    }

    #[test]
    fn test_seat_players_rejects_bad_rosters() {
        assert_eq!(
            seat_players(&[PlayerSeat::new("solo")]),
            Err(CreateGameError::PlayerCount(1))
        );
        let five: Vec<PlayerSeat> = (0..5).map(|i| PlayerSeat::new(format!("p{}", i))).collect();
        assert_eq!(seat_players(&five), Err(CreateGameError::PlayerCount(5)));
        assert_eq!(
            seat_players(&[PlayerSeat::new("a"), PlayerSeat::new("  ")]),
            Err(CreateGameError::EmptyName(1))
        );
    }
}
