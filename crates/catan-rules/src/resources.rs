//! Resources, the shared bank, and dice production.
//!
//! This module contains:
//! - The five resource types and `ResourceHand` counts
//! - Building costs
//! - The finite `Bank` every game draws from and pays back into
//! - Production planning for a dice roll, including the bank shortfall rule

use crate::board::Board;
use crate::ledger::BuildingLedger;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cards of each resource type in the game
pub const STOCK_PER_RESOURCE: u32 = 19;

/// Resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Sheep => "sheep",
            Resource::Wheat => "wheat",
            Resource::Ore => "ore",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts, in `Resource::ALL` order
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    /// A hand holding `amount` of every resource
    pub fn uniform(amount: u32) -> Self {
        Self::with_amounts(amount, amount, amount, amount, amount)
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.wood + self.brick + self.sheep + self.wheat + self.ore
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Wood => self.wood = count,
            Resource::Brick => self.brick = count,
            Resource::Sheep => self.sheep = count,
            Resource::Wheat => self.wheat = count,
            Resource::Ore => self.ore = count,
        }
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        self.set(resource, self.get(resource) + amount);
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Check if this hand covers a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    /// Subtract a cost (panics if insufficient)
    pub fn subtract(&mut self, cost: &ResourceHand) {
        assert!(self.can_afford(cost), "Cannot afford {:?} from {:?}", cost, self);
        for resource in Resource::ALL {
            self.set(resource, self.get(resource) - cost.get(resource));
        }
    }

    /// Resource types with a non-zero count
    pub fn kinds(&self) -> impl Iterator<Item = Resource> + '_ {
        Resource::ALL.into_iter().filter(|&r| self.get(r) > 0)
    }

    /// Remove a uniformly random card (for robber stealing)
    pub fn steal_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let available: Vec<Resource> = Resource::ALL
            .iter()
            .flat_map(|&r| std::iter::repeat(r).take(self.get(r) as usize))
            .collect();

        let resource = *available.choose(rng)?;
        self.subtract(&ResourceHand::single(resource, 1));
        Some(resource)
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 wood, 1 brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 wood, 1 brick, 1 sheep, 1 wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// Cost to upgrade to city: 2 wheat, 3 ore
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 2, 3)
    }

    /// Cost to buy a development card: 1 sheep, 1 wheat, 1 ore
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

/// The shared pool of resource cards not held by any player.
///
/// Cards only ever move between the bank and player hands, so for every
/// resource `bank + Σ hands == STOCK_PER_RESOURCE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    stock: ResourceHand,
}

impl Bank {
    /// A full bank
    pub fn new() -> Self {
        Self {
            stock: ResourceHand::uniform(STOCK_PER_RESOURCE),
        }
    }

    pub fn stock(&self) -> &ResourceHand {
        &self.stock
    }

    pub fn available(&self, resource: Resource) -> u32 {
        self.stock.get(resource)
    }

    pub fn can_supply(&self, hand: &ResourceHand) -> bool {
        self.stock.can_afford(hand)
    }

    /// Take cards back from a player
    pub fn deposit(&mut self, hand: &ResourceHand) {
        self.stock.add_hand(hand);
        for resource in Resource::ALL {
            assert!(
                self.stock.get(resource) <= STOCK_PER_RESOURCE,
                "bank holds more {} than exist",
                resource
            );
        }
    }

    /// Hand cards out to a player (panics if the bank would go negative)
    pub fn withdraw(&mut self, hand: &ResourceHand) {
        self.stock.subtract(hand);
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

/// Resources a single roll hands out, after the shortfall rule is applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionPlan {
    /// Credit per player, in seat order
    pub grants: Vec<ResourceHand>,
    /// Resource types nobody receives because demand exceeded the bank
    pub withheld: Vec<Resource>,
}

impl ProductionPlan {
    /// Everything the bank pays out under this plan
    pub fn total(&self) -> ResourceHand {
        let mut total = ResourceHand::new();
        for grant in &self.grants {
            total.add_hand(grant);
        }
        total
    }
}

/// Work out what a roll produces without touching any state.
///
/// A tile produces when its number matches and the robber is elsewhere;
/// settlements collect 1 and cities 2. If the total demand for one resource
/// type exceeds what the bank holds, that type is withheld from everyone.
pub fn plan_production(
    board: &Board,
    ledger: &BuildingLedger,
    bank: &Bank,
    player_count: usize,
    roll: u8,
) -> ProductionPlan {
    let mut demand = vec![ResourceHand::new(); player_count];

    for tile in board.tiles() {
        if tile.number != Some(roll) || board.robber() == tile.id {
            continue;
        }
        let Some(resource) = tile.resource() else {
            continue;
        };
        for &vertex in board.tile_vertices(tile.id) {
            let building = ledger.building_at(vertex);
            if let Some(owner) = building.owner() {
                demand[owner as usize].add(resource, building.resource_multiplier());
            }
        }
    }

    let mut withheld = Vec::new();
    for resource in Resource::ALL {
        let requested: u32 = demand.iter().map(|hand| hand.get(resource)).sum();
        if requested > bank.available(resource) {
            withheld.push(resource);
            for hand in &mut demand {
                hand.set(resource, 0);
            }
        }
    }

    ProductionPlan {
        grants: demand,
        withheld,
    }
}
