//! Container - a shipping and trading board game engine
//!
//! This crate provides the rules engine for Container, including:
//! - Pieces, supply pools and point cards
//! - Player state, ships and the chained follow-up moves
//! - The legal-move calculator and the transition engine
//! - The island auction, loan upkeep and end-game scoring
//! - Undo and audit by replaying the game log from its seed
//!
//! # Architecture
//!
//! The engine is synchronous and platform-agnostic. It can be compiled to:
//! - Native Rust for hosting tables and bot self-play
//! - WebAssembly for client-side play
//!
//! # Modules
//!
//! - [`pieces`]: Colors, piece ids, supply pools and point cards
//! - [`player`]: Player state, ships and chain tracking
//! - [`moves`]: Moves and the per-kind map of legal arguments
//! - [`game`]: Game state machine with full rule enforcement
//! - [`scoring`]: End-game scoring and breakdowns

mod available;
pub mod bot;
pub mod describe;
pub mod game;
pub mod log;
pub mod moves;
pub mod pieces;
pub mod player;
pub mod rng;
pub mod scoring;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use bot::{Bot, BotStyle};
pub use game::{GameError, GameOptions, GameState, IllegalMove, Phase, SeizedPieces};
pub use log::{GameEvent, LogItem};
pub use moves::{AvailableMoves, Move, MoveName, StoreOffer};
pub use pieces::{
    ContainerColor, ContainerId, ContainerPiece, FactoryId, FactoryPiece, LoanId, LoanPiece,
    PlayerId, PointCard, Pool, ShipId, WarehouseId, WarehousePiece,
};
pub use player::{Chain, ContainerOnStore, Player, Ship, ShipPosition};
pub use scoring::{score_player, ScoreBreakdown};
