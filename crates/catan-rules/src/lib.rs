//! Catan Rules - authoritative rules engine for a Catan-style board game
//!
//! This crate owns the state of one game session and decides what is legal:
//! - Hex coordinate system and the derived vertex/edge graph of the board
//! - Resource bank, building costs and dice production
//! - Development card deck and hands
//! - Action validation and the turn/phase state machine
//! - Longest Road and Largest Army tracking
//!
//! # Architecture
//!
//! [`GameEngine`] is the single writer of a [`Game`]. Every state change goes
//! through [`GameEngine::apply`], which runs the pure [`validate`] function
//! first; a rejected action leaves the state untouched. After an accepted
//! action the engine recomputes bonuses, checks for a winner and verifies the
//! conservation invariants.
//!
//! The engine knows nothing about rooms or networking. Hosts feed it
//! [`Action`]s and forward the returned [`GameEvent`]s together with a
//! [`PublicView`] and each seat's [`PrivateView`].
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for hex tiles, vertices, and edges
//! - [`board`]: Tiles, ports, the robber and adjacency tables
//! - [`resources`]: Hands, the bank, costs and production
//! - [`ledger`]: Who has built what where, and the spatial rules
//! - [`deck`]: Development cards
//! - [`validate`] / [`engine`]: Checking and applying actions

pub mod actions;
pub mod board;
pub mod bonus;
pub mod config;
pub mod deck;
pub mod engine;
pub mod game;
pub mod hex;
pub mod ledger;
pub mod legal;
pub mod player;
pub mod resources;
pub mod validate;
pub mod view;

// Re-export commonly used types
pub use actions::{Action, CardData, GameEvent, TradeOffer, ACTION_TYPES};
pub use board::{Board, EdgeId, PlayerId, Port, Tile, TileId, TileKind, VertexId};
pub use bonus::BonusTracker;
pub use config::{BoardLayout, GameConfig};
pub use deck::{DevCardHand, DevelopmentCard, DevelopmentDeck};
pub use engine::GameEngine;
pub use game::{CreateGameError, Game, GamePhase, InvariantViolation, RuleError, SetupPlacing, SpatialViolation};
pub use hex::{EdgeCoord, HexCoord, VertexCoord};
pub use ledger::{BuildingLedger, EdgeBuilding, VertexBuilding};
pub use legal::legal_actions;
pub use player::{Player, PlayerColor, PlayerSeat};
pub use resources::{Bank, Resource, ResourceHand};
pub use validate::validate;
pub use view::{PlayerSummary, PrivateView, PublicView};
