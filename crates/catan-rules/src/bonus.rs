//! Longest Road and Largest Army ownership.

use crate::actions::GameEvent;
use crate::board::{Board, PlayerId};
use crate::ledger::BuildingLedger;
use crate::player::Player;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Victory points each bonus is worth
pub const BONUS_POINTS: u32 = 2;

/// Current bonus holders and the measured road lengths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusTracker {
    pub longest_road_owner: Option<PlayerId>,
    pub largest_army_owner: Option<PlayerId>,
    /// Longest trail per seat as of the last recompute
    pub road_lengths: Vec<u32>,
}

impl BonusTracker {
    pub fn new(player_count: usize) -> Self {
        Self {
            longest_road_owner: None,
            largest_army_owner: None,
            road_lengths: vec![0; player_count],
        }
    }

    /// Remeasure every player's longest trail and move the bonus if needed
    pub fn refresh_longest_road(
        &mut self,
        board: &Board,
        ledger: &BuildingLedger,
        players: &mut [Player],
        min_length: u32,
    ) -> Option<GameEvent> {
        self.road_lengths = players
            .iter()
            .map(|p| ledger.longest_road(board, p.id))
            .collect();

        let previous = self.longest_road_owner;
        let current = resolve_holder(previous, &self.road_lengths, min_length);
        if current == previous {
            return None;
        }

        transfer_points(players, previous, current);
        self.longest_road_owner = current;
        let length = current.map_or(0, |p| self.road_lengths[p as usize]);
        info!(?previous, ?current, length, "longest road changed hands");
        Some(GameEvent::LongestRoadChanged {
            previous,
            current,
            length,
        })
    }

    /// Compare played knights and move the bonus if needed
    pub fn refresh_largest_army(&mut self, players: &mut [Player], min_knights: u32) -> Option<GameEvent> {
        let knights: Vec<u32> = players.iter().map(|p| p.played_knights).collect();

        let previous = self.largest_army_owner;
        let current = resolve_holder(previous, &knights, min_knights);
        if current == previous {
            return None;
        }

        transfer_points(players, previous, current);
        self.largest_army_owner = current;
        let knights = current.map_or(0, |p| knights[p as usize]);
        info!(?previous, ?current, knights, "largest army changed hands");
        Some(GameEvent::LargestArmyChanged {
            previous,
            current,
            knights,
        })
    }

    /// Bonus points currently credited to `player`
    pub fn points_for(&self, player: PlayerId) -> u32 {
        let mut points = 0;
        if self.longest_road_owner == Some(player) {
            points += BONUS_POINTS;
        }
        if self.largest_army_owner == Some(player) {
            points += BONUS_POINTS;
        }
        points
    }
}

/// Decide who should hold a bonus given per-seat scores.
///
/// The incumbent keeps it while still qualifying and not strictly beaten.
/// Otherwise it goes to the unique top scorer at or above the minimum, and to
/// nobody when the top is shared.
pub fn resolve_holder(incumbent: Option<PlayerId>, scores: &[u32], min: u32) -> Option<PlayerId> {
    let max = scores.iter().copied().max().unwrap_or(0);

    if let Some(holder) = incumbent {
        let score = scores.get(holder as usize).copied().unwrap_or(0);
        if score >= min && score == max {
            return Some(holder);
        }
    }

    if max < min {
        return None;
    }
    let mut leaders = scores.iter().enumerate().filter(|(_, s)| **s == max);
    match (leaders.next(), leaders.next()) {
        (Some((seat, _)), None) => Some(seat as PlayerId),
        _ => None,
    }
}

fn transfer_points(players: &mut [Player], from: Option<PlayerId>, to: Option<PlayerId>) {
    if let Some(from) = from {
        players[from as usize].victory_points -= BONUS_POINTS;
    }
    if let Some(to) = to {
        players[to as usize].victory_points += BONUS_POINTS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerColor;

    fn players(n: u8) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(i, format!("p{}", i), PlayerColor::PALETTE[i as usize]))
            .collect()
    }

    #[test]
    fn test_unclaimed_needs_minimum() {
        assert_eq!(resolve_holder(None, &[4, 3], 5), None);
        assert_eq!(resolve_holder(None, &[5, 3], 5), Some(0));
        assert_eq!(resolve_holder(None, &[2, 6, 1], 5), Some(1));
    }

    #[test]
    fn test_unclaimed_tie_goes_to_nobody() {
        assert_eq!(resolve_holder(None, &[6, 6], 5), None);
    }

    #[test]
    fn test_incumbent_keeps_on_tie() {
        assert_eq!(resolve_holder(Some(0), &[6, 6], 5), Some(0));
        assert_eq!(resolve_holder(Some(0), &[6, 7], 5), Some(1));
    }

    #[test]
    fn test_incumbent_broken_below_minimum() {
        assert_eq!(resolve_holder(Some(0), &[4, 5, 2], 5), Some(1));
        assert_eq!(resolve_holder(Some(0), &[4, 3, 2], 5), None);
        assert_eq!(resolve_holder(Some(0), &[3, 6, 6], 5), None);
    }

    #[test]
    fn test_largest_army_transfer_moves_two_points() {
        let mut tracker = BonusTracker::new(2);
        let mut players = players(2);

        players[0].played_knights = 3;
        let event = tracker.refresh_largest_army(&mut players, 3);
        assert_eq!(
            event,
            Some(GameEvent::LargestArmyChanged {
                previous: None,
                current: Some(0),
                knights: 3
            })
        );
        assert_eq!(players[0].victory_points, 2);

        players[1].played_knights = 3;
        assert_eq!(tracker.refresh_largest_army(&mut players, 3), None);

        players[1].played_knights = 4;
        assert!(tracker.refresh_largest_army(&mut players, 3).is_some());
        assert_eq!(players[0].victory_points, 0);
        assert_eq!(players[1].victory_points, 2);
        assert_eq!(tracker.points_for(1), 2);
        assert_eq!(tracker.points_for(0), 0);
    }

    #[test]
    fn test_longest_road_refresh_measures_trails() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        let mut players = players(2);
        let mut tracker = BonusTracker::new(2);

        let corners = *board.tile_vertices(crate::board::TileId(0));
        for i in 0..5 {
            let e = board.edge_between(corners[i], corners[i + 1]).unwrap();
            ledger.place_road(e, 1);
        }

        let event = tracker.refresh_longest_road(&board, &ledger, &mut players, 5);
        assert!(matches!(
            event,
            Some(GameEvent::LongestRoadChanged { current: Some(1), length: 5, .. })
        ));
        assert_eq!(tracker.road_lengths, vec![0, 5]);
        assert_eq!(players[1].victory_points, 2);
    }
}
