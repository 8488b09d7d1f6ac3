//! Game actions that players can take.
//!
//! This module defines the action payloads accepted by the engine (their JSON
//! shape is the wire format) and the events that result from applying them.

use crate::board::{EdgeId, PlayerId, TileId, VertexId};
use crate::deck::DevelopmentCard;
use crate::game::RuleError;
use crate::resources::{Resource, ResourceHand};
use serde::{Deserialize, Serialize};

/// Names accepted in the `type` field
pub const ACTION_TYPES: [&str; 13] = [
    "diceRoll",
    "buildRoad",
    "buildSettlement",
    "buildCity",
    "buyDevelopmentCard",
    "trade",
    "acceptTrade",
    "rejectTrade",
    "playDevelopmentCard",
    "moveRobber",
    "discard",
    "endTurn",
    "skipTurn",
];

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    // ==================== Turn Actions ====================
    /// Dice result for the current player (1-6 each)
    DiceRoll { value1: u8, value2: u8 },

    // ==================== Building Actions ====================
    /// Build a road on the edge between two corners
    BuildRoad {
        player_id: PlayerId,
        from: VertexId,
        to: VertexId,
    },
    BuildSettlement {
        player_id: PlayerId,
        position: VertexId,
    },
    /// Upgrade a settlement to a city
    BuildCity {
        player_id: PlayerId,
        position: VertexId,
    },
    BuyDevelopmentCard { player_id: PlayerId },

    // ==================== Trading Actions ====================
    /// Bank trade without a target, otherwise a proposal to `target_player`
    Trade {
        player_id: PlayerId,
        offering: ResourceHand,
        requesting: ResourceHand,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_player: Option<PlayerId>,
    },
    /// The target of the pending proposal accepts it
    AcceptTrade { player_id: PlayerId },
    RejectTrade { player_id: PlayerId },

    // ==================== Development Card Actions ====================
    PlayDevelopmentCard {
        player_id: PlayerId,
        card_type: DevelopmentCard,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        card_data: Option<CardData>,
    },

    // ==================== Robber Actions ====================
    MoveRobber {
        player_id: PlayerId,
        tile_position: TileId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        steal_from: Option<PlayerId>,
    },
    /// Discard half a hand after a 7
    Discard {
        player_id: PlayerId,
        discarding: ResourceHand,
    },

    // ==================== Turn Management ====================
    EndTurn { player_id: PlayerId },
    /// Injected by the session layer (turn timer, disconnect)
    SkipTurn { player_id: PlayerId },
}

/// Choices that accompany some development cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardData {
    /// Year of Plenty: two resources (may be the same)
    YearOfPlenty { resources: [Resource; 2] },
    /// Monopoly: the resource to collect
    Monopoly { resource: Resource },
}

impl Action {
    /// Parse a wire payload, distinguishing unknown types and cards from
    /// otherwise malformed input.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RuleError> {
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| RuleError::MalformedAction("missing \"type\"".into()))?;
        if !ACTION_TYPES.contains(&kind) {
            return Err(RuleError::UnknownActionType(kind.to_string()));
        }
        if kind == "playDevelopmentCard" {
            if let Some(card) = value.get("cardType").and_then(|c| c.as_str()) {
                if DevelopmentCard::from_name(card).is_none() {
                    return Err(RuleError::UnknownCard(card.to_string()));
                }
            }
        }
        serde_json::from_value(value).map_err(|e| RuleError::MalformedAction(e.to_string()))
    }

    /// The acting player; a dice roll always belongs to the current player
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Action::DiceRoll { .. } => None,
            Action::BuildRoad { player_id, .. }
            | Action::BuildSettlement { player_id, .. }
            | Action::BuildCity { player_id, .. }
            | Action::BuyDevelopmentCard { player_id }
            | Action::Trade { player_id, .. }
            | Action::AcceptTrade { player_id }
            | Action::RejectTrade { player_id }
            | Action::PlayDevelopmentCard { player_id, .. }
            | Action::MoveRobber { player_id, .. }
            | Action::Discard { player_id, .. }
            | Action::EndTurn { player_id }
            | Action::SkipTurn { player_id } => Some(*player_id),
        }
    }

    /// The wire name of this action
    pub fn kind(&self) -> &'static str {
        match self {
            Action::DiceRoll { .. } => "diceRoll",
            Action::BuildRoad { .. } => "buildRoad",
            Action::BuildSettlement { .. } => "buildSettlement",
            Action::BuildCity { .. } => "buildCity",
            Action::BuyDevelopmentCard { .. } => "buyDevelopmentCard",
            Action::Trade { .. } => "trade",
            Action::AcceptTrade { .. } => "acceptTrade",
            Action::RejectTrade { .. } => "rejectTrade",
            Action::PlayDevelopmentCard { .. } => "playDevelopmentCard",
            Action::MoveRobber { .. } => "moveRobber",
            Action::Discard { .. } => "discard",
            Action::EndTurn { .. } => "endTurn",
            Action::SkipTurn { .. } => "skipTurn",
        }
    }
}

/// A proposed trade between two players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOffer {
    /// Player making the offer
    pub from: PlayerId,
    /// Player who must accept or reject
    pub to: PlayerId,
    /// Resources `from` gives
    pub offering: ResourceHand,
    /// Resources `from` receives
    pub requesting: ResourceHand,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameEvent {
    /// Dice were rolled
    DiceRolled {
        player: PlayerId,
        values: (u8, u8),
        total: u8,
    },

    /// Resources were handed out after a roll
    ResourcesProduced {
        grants: Vec<(PlayerId, ResourceHand)>,
        /// Types nobody received because the bank ran short
        withheld: Vec<Resource>,
    },

    /// Players over the limit must discard before the robber moves
    DiscardRequired { players: Vec<PlayerId> },

    SettlementBuilt { player: PlayerId, vertex: VertexId },

    /// A settlement was upgraded to a city
    CityBuilt { player: PlayerId, vertex: VertexId },

    RoadBuilt {
        player: PlayerId,
        edge: EdgeId,
        /// Placed without paying (setup or Road Building)
        free: bool,
    },

    /// A development card was bought (the card stays private)
    DevelopmentCardBought { player: PlayerId },

    KnightPlayed { player: PlayerId },

    RoadBuildingPlayed { player: PlayerId },

    YearOfPlentyPlayed {
        player: PlayerId,
        resources: [Resource; 2],
    },

    MonopolyPlayed {
        player: PlayerId,
        resource: Resource,
        total_taken: u32,
    },

    /// Victory point cards were turned face up
    VictoryPointsRevealed { player: PlayerId, count: u32 },

    /// The robber was moved
    RobberMoved {
        player: PlayerId,
        from: TileId,
        to: TileId,
    },

    /// A resource was stolen
    ResourceStolen {
        thief: PlayerId,
        victim: PlayerId,
        /// Hidden from other players
        resource: Option<Resource>,
    },

    /// Player had to discard cards
    CardsDiscarded { player: PlayerId, count: u32 },

    /// A trade was proposed
    TradeProposed { offer: TradeOffer },

    /// A trade was accepted and carried out
    TradeCompleted { from: PlayerId, to: PlayerId },

    /// The target turned the proposal down
    TradeRejected { from: PlayerId, to: PlayerId },

    /// Trade with the bank or a port
    BankTradeCompleted {
        player: PlayerId,
        gave: ResourceHand,
        received: ResourceHand,
    },

    /// Longest road changed hands
    LongestRoadChanged {
        previous: Option<PlayerId>,
        current: Option<PlayerId>,
        length: u32,
    },

    /// Largest army changed hands
    LargestArmyChanged {
        previous: Option<PlayerId>,
        current: Option<PlayerId>,
        knights: u32,
    },

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
        skipped: bool,
    },

    /// A player won the game
    GameWon {
        player: PlayerId,
        victory_points: u32,
    },
}

impl GameEvent {
    /// The event as `viewer` may see it: stolen cards are hidden from bystanders
    pub fn redacted_for(&self, viewer: Option<PlayerId>) -> GameEvent {
        match self {
            GameEvent::ResourceStolen { thief, victim, .. }
                if viewer != Some(*thief) && viewer != Some(*victim) =>
            {
                GameEvent::ResourceStolen {
                    thief: *thief,
                    victim: *victim,
                    resource: None,
                }
            }
            other => other.clone(),
        }
    }
}
