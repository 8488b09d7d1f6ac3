//! Core game state.
//!
//! This module contains the `Game` struct owned by the engine, the phase
//! machine's states, and the error types shared across the crate.

use crate::actions::TradeOffer;
use crate::board::{Board, PlayerId, VertexId};
use crate::bonus::BonusTracker;
use crate::config::{BoardLayout, GameConfig};
use crate::deck::{DevelopmentCard, DevelopmentDeck, DECK_SIZE};
use crate::ledger::BuildingLedger;
use crate::player::{seat_players, Player, PlayerSeat, CITY_PIECES, ROAD_PIECES, SETTLEMENT_PIECES};
use crate::resources::{Bank, Resource, STOCK_PER_RESOURCE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Game phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GamePhase {
    /// Initial placement: round 1 in seat order, round 2 reversed
    Setup {
        /// Which round of setup (1 or 2)
        round: u8,
        /// What we're currently placing
        placing: SetupPlacing,
    },

    /// Before rolling dice at start of turn
    Rolling,

    /// Main phase - can trade, build, buy or play cards, end turn
    Main,

    /// Players must discard half their cards (rolled 7, over the limit)
    Discard {
        /// Players who still need to discard
        pending: Vec<PlayerId>,
    },

    /// The current player must move the robber
    MoveRobber,

    /// Game is over
    Ended { winner: PlayerId },
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::Setup { .. } => "setup",
            GamePhase::Rolling => "rolling",
            GamePhase::Main => "main",
            GamePhase::Discard { .. } => "discard",
            GamePhase::MoveRobber => "moveRobber",
            GamePhase::Ended { .. } => "ended",
        }
    }
}

/// What we're placing during setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "piece", rename_all = "camelCase")]
pub enum SetupPlacing {
    Settlement,
    /// A road touching the settlement just placed
    Road { settlement: VertexId },
}

/// Which spatial rule a placement broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpatialViolation {
    /// The slot already holds a piece
    Occupied,
    /// A building sits on the vertex or one edge away
    TooClose,
    /// Not connected to the player's network
    Disconnected,
    /// City upgrade without the player's settlement there
    NotOwnSettlement,
    /// The two corners of a road are not adjacent
    NotAnEdge,
    /// Vertex id off the board
    UnknownLocation,
}

/// Why an action was rejected. Rejections never change state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum RuleError {
    #[error("not your turn")]
    NotYourTurn,

    #[error("{action} is not allowed during {phase}")]
    InvalidPhase { action: String, phase: String },

    #[error("not enough resources")]
    InsufficientResources,

    #[error("placement breaks a spatial rule: {0:?}")]
    SpatialRuleViolation(SpatialViolation),

    #[error("unknown development card {0:?}")]
    UnknownCard(String),

    #[error("no playable {0} card in hand")]
    CardNotHeld(DevelopmentCard),

    #[error("must discard exactly {expected} cards from those held, got {got}")]
    InvalidDiscardCount { expected: u32, got: u32 },

    #[error("invalid robber target")]
    InvalidRobberTarget,

    #[error("unknown action type {0:?}")]
    UnknownActionType(String),

    #[error("dice values must be between 1 and 6")]
    InvalidDice,

    #[error("invalid trade")]
    InvalidTrade,

    #[error("no pending trade for this player")]
    NoPendingTrade,

    #[error("no development cards left in deck")]
    DeckEmpty,

    #[error("no pieces of that kind remaining")]
    NoPiecesRemaining,

    #[error("a development card was already played this turn")]
    CardAlreadyPlayed,

    #[error("missing or mismatched card data")]
    InvalidCardData,

    #[error("victory point cards can only be revealed to reach the winning total")]
    VictoryThresholdNotReached,

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("malformed action: {0}")]
    MalformedAction(String),

    #[error("game is over")]
    GameOver,
}

impl RuleError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RuleError::NotYourTurn => "NotYourTurn",
            RuleError::InvalidPhase { .. } => "InvalidPhase",
            RuleError::InsufficientResources => "InsufficientResources",
            RuleError::SpatialRuleViolation(_) => "SpatialRuleViolation",
            RuleError::UnknownCard(_) => "UnknownCard",
            RuleError::CardNotHeld(_) => "CardNotHeld",
            RuleError::InvalidDiscardCount { .. } => "InvalidDiscardCount",
            RuleError::InvalidRobberTarget => "InvalidRobberTarget",
            RuleError::UnknownActionType(_) => "UnknownActionType",
            RuleError::InvalidDice => "InvalidDice",
            RuleError::InvalidTrade => "InvalidTrade",
            RuleError::NoPendingTrade => "NoPendingTrade",
            RuleError::DeckEmpty => "DeckEmpty",
            RuleError::NoPiecesRemaining => "NoPiecesRemaining",
            RuleError::CardAlreadyPlayed => "CardAlreadyPlayed",
            RuleError::InvalidCardData => "InvalidCardData",
            RuleError::VictoryThresholdNotReached => "VictoryThresholdNotReached",
            RuleError::UnknownPlayer(_) => "UnknownPlayer",
            RuleError::MalformedAction(_) => "MalformedAction",
            RuleError::GameOver => "GameOver",
        }
    }
}

/// Problems with the roster or settings at game creation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateGameError {
    #[error("a game needs 2 to 4 players, got {0}")]
    PlayerCount(usize),

    #[error("player in seat {0} has no name")]
    EmptyName(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// A broken internal invariant. Reaching one means validation let a bad
/// action through; the engine treats it as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{resource} is not conserved: bank and hands hold {total}")]
    ResourceNotConserved { resource: Resource, total: u32 },

    #[error("player {player} shows {actual} VP but owns {expected}")]
    ScoreMismatch {
        player: PlayerId,
        expected: u32,
        actual: u32,
    },

    #[error("player {player} piece supply disagrees with the board")]
    PieceMismatch { player: PlayerId },

    #[error("robber is off the board")]
    RobberOffBoard,

    #[error("deck holds {0} cards")]
    DeckOverflow(usize),
}

/// The complete state of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub room_code: String,
    pub config: GameConfig,
    /// All players, in seat order
    pub players: Vec<Player>,
    pub board: Board,
    pub ledger: BuildingLedger,
    pub bank: Bank,
    pub deck: DevelopmentDeck,
    pub phase: GamePhase,
    /// 0 during setup, then 1 for the first rolled turn
    pub turn_number: u32,
    /// Current player index
    pub current_player: PlayerId,
    /// Dice of the current turn, once rolled
    pub dice: Option<(u8, u8)>,
    pub bonuses: BonusTracker,
    /// Proposal awaiting the target's answer
    pub pending_trade: Option<TradeOffer>,
    /// Roads still free from a Road Building card
    pub free_roads: u32,
    /// Whether a non-VP development card was played this turn
    pub dev_card_played: bool,
}

impl Game {
    /// Deal a fresh game: seat the roster, lay out the board, shuffle the deck
    pub fn new<R: Rng>(
        room_code: impl Into<String>,
        roster: &[PlayerSeat],
        config: GameConfig,
        rng: &mut R,
    ) -> Result<Self, CreateGameError> {
        config.validate()?;
        let players = seat_players(roster)?;
        let board = match config.layout {
            BoardLayout::Random => Board::standard_with_rng(rng),
            BoardLayout::Beginner => Board::beginner(),
        };
        let ledger = BuildingLedger::new(&board);
        let deck = DevelopmentDeck::shuffled(rng);

        Ok(Self {
            room_code: room_code.into(),
            config,
            bonuses: BonusTracker::new(players.len()),
            players,
            board,
            ledger,
            bank: Bank::new(),
            deck,
            phase: GamePhase::Setup {
                round: 1,
                placing: SetupPlacing::Settlement,
            },
            turn_number: 0,
            current_player: 0,
            dice: None,
            pending_trade: None,
            free_roads: 0,
            dev_card_played: false,
        })
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    pub fn current(&self) -> &Player {
        &self.players[self.current_player as usize]
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Ended { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::Ended { winner } => Some(winner),
            _ => None,
        }
    }

    /// Check every conservation and scoring invariant
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for resource in Resource::ALL {
            let total = self.bank.available(resource)
                + self.players.iter().map(|p| p.resources.get(resource)).sum::<u32>();
            if total != STOCK_PER_RESOURCE {
                return Err(InvariantViolation::ResourceNotConserved { resource, total });
            }
        }

        for player in &self.players {
            let expected = self.ledger.building_points(player.id)
                + player.revealed_victory_cards
                + self.bonuses.points_for(player.id);
            if expected != player.victory_points {
                return Err(InvariantViolation::ScoreMismatch {
                    player: player.id,
                    expected,
                    actual: player.victory_points,
                });
            }

            let settlements = self.ledger.settlement_count(player.id);
            let cities = self.ledger.city_count(player.id);
            let roads = self.ledger.road_count(player.id);
            if settlements + player.settlements_remaining != SETTLEMENT_PIECES
                || cities + player.cities_remaining != CITY_PIECES
                || roads + player.roads_remaining != ROAD_PIECES
            {
                return Err(InvariantViolation::PieceMismatch { player: player.id });
            }
        }

        if !self.board.is_tile(self.board.robber()) {
            return Err(InvariantViolation::RobberOffBoard);
        }
        if self.deck.len() > DECK_SIZE {
            return Err(InvariantViolation::DeckOverflow(self.deck.len()));
        }
        Ok(())
    }
}
