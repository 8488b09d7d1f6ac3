//! Projections of the game state sent to clients.
//!
//! The public view is safe to broadcast: it carries hand sizes but never hand
//! contents, and hidden victory point cards are left out of the scores. Each
//! seat additionally gets a private view with its own hand.

use crate::actions::TradeOffer;
use crate::board::{Board, PlayerId, Port, TileId, VertexId};
use crate::deck::DevCardHand;
use crate::game::{Game, GamePhase};
use crate::hex::HexCoord;
use crate::ledger::VertexBuilding;
use crate::player::{Player, PlayerColor};
use crate::resources::{Resource, ResourceHand};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileView {
    pub id: TileId,
    pub coord: HexCoord,
    /// `None` for the desert
    pub resource: Option<Resource>,
    pub number: Option<u8>,
    pub has_robber: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortView {
    pub port: Port,
    pub vertices: [VertexId; 2],
}

/// What everyone can see about a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    /// Excludes face-down victory point cards
    pub victory_points: u32,
    pub resource_count: u32,
    pub dev_card_count: u32,
    pub played_knights: u32,
    pub settlements: Vec<VertexId>,
    pub cities: Vec<VertexId>,
    /// Each road as its two endpoints
    pub roads: Vec<[VertexId; 2]>,
    pub road_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicView {
    pub room_code: String,
    pub tiles: Vec<TileView>,
    pub ports: Vec<PortView>,
    pub players: Vec<PlayerSummary>,
    pub phase: GamePhase,
    pub turn_number: u32,
    pub current_player: PlayerId,
    pub dice: Option<(u8, u8)>,
    pub robber: TileId,
    pub longest_road_owner: Option<PlayerId>,
    pub largest_army_owner: Option<PlayerId>,
    pub bank: ResourceHand,
    pub deck_remaining: usize,
    pub pending_trade: Option<TradeOffer>,
}

impl PublicView {
    pub fn of(game: &Game) -> Self {
        Self {
            room_code: game.room_code.clone(),
            tiles: tile_views(&game.board),
            ports: game
                .board
                .ports()
                .iter()
                .map(|p| PortView {
                    port: p.port,
                    vertices: game.board.vertices_of_edge(p.edge),
                })
                .collect(),
            players: game.players.iter().map(|p| summarize(game, p)).collect(),
            phase: game.phase.clone(),
            turn_number: game.turn_number,
            current_player: game.current_player,
            dice: game.dice,
            robber: game.board.robber(),
            longest_road_owner: game.bonuses.longest_road_owner,
            largest_army_owner: game.bonuses.largest_army_owner,
            bank: *game.bank.stock(),
            deck_remaining: game.deck.len(),
            pending_trade: game.pending_trade.clone(),
        }
    }
}

fn tile_views(board: &Board) -> Vec<TileView> {
    let robber = board.robber();
    board
        .tiles()
        .iter()
        .map(|t| TileView {
            id: t.id,
            coord: t.coord,
            resource: t.resource(),
            number: t.number,
            has_robber: t.id == robber,
        })
        .collect()
}

fn summarize(game: &Game, player: &Player) -> PlayerSummary {
    let mut settlements = Vec::new();
    let mut cities = Vec::new();
    for (v, building) in game.ledger.buildings() {
        match building {
            VertexBuilding::Settlement(p) if p == player.id => settlements.push(v),
            VertexBuilding::City(p) if p == player.id => cities.push(v),
            _ => {}
        }
    }

    PlayerSummary {
        id: player.id,
        name: player.name.clone(),
        color: player.color,
        victory_points: player.victory_points,
        resource_count: player.resources.total(),
        dev_card_count: player.dev_card_count(),
        played_knights: player.played_knights,
        settlements,
        cities,
        roads: game
            .ledger
            .roads_of(player.id)
            .map(|e| game.board.vertices_of_edge(e))
            .collect(),
        road_length: game
            .bonuses
            .road_lengths
            .get(player.id as usize)
            .copied()
            .unwrap_or(0),
    }
}

/// The public view plus one player's own hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateView {
    #[serde(flatten)]
    pub public: PublicView,
    pub player: PlayerId,
    pub resources: ResourceHand,
    /// Playable development cards
    pub dev_cards: DevCardHand,
    /// Cards bought this turn, playable from the next one
    pub new_dev_cards: DevCardHand,
    pub hidden_victory_points: u32,
}

impl PrivateView {
    pub fn of(game: &Game, player: PlayerId) -> Option<Self> {
        let p = game.player(player)?;
        Some(Self {
            public: PublicView::of(game),
            player,
            resources: p.resources,
            dev_cards: p.dev_cards,
            new_dev_cards: p.bought_this_turn,
            hidden_victory_points: p.hidden_victory_points(),
        })
    }
}
