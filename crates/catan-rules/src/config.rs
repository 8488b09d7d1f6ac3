//! Per-game settings supplied at creation.

use crate::game::CreateGameError;
use serde::{Deserialize, Serialize};

/// Which board to deal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoardLayout {
    /// Shuffled tiles, numbers and port types
    #[default]
    Random,
    /// The fixed starter layout
    Beginner,
}

/// Game settings. Every field has the standard-rules default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub victory_points_to_win: u32,
    /// Shortest trail that can hold Longest Road
    pub longest_road_min: u32,
    /// Fewest played knights that can hold Largest Army
    pub largest_army_min: u32,
    /// Players holding more than this on a 7 must discard half
    pub discard_limit: u32,
    pub layout: BoardLayout,
    /// Seed for a reproducible game; entropy when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            victory_points_to_win: 10,
            longest_road_min: 5,
            largest_army_min: 3,
            discard_limit: 7,
            layout: BoardLayout::Random,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, layout: BoardLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Reject thresholds that would hand out a win or a bonus for nothing
    pub fn validate(&self) -> Result<(), CreateGameError> {
        if self.victory_points_to_win == 0 {
            return Err(CreateGameError::InvalidConfig("victoryPointsToWin must be positive"));
        }
        if self.longest_road_min == 0 {
            return Err(CreateGameError::InvalidConfig("longestRoadMin must be positive"));
        }
        if self.largest_army_min == 0 {
            return Err(CreateGameError::InvalidConfig("largestArmyMin must be positive"));
        }
        Ok(())
    }
}
