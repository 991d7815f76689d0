//! Tictac-Minimax: an unbeatable tic-tac-toe engine.
//!
//! This crate provides the game state, an exhaustive minimax search that
//! prefers quick wins and slow losses, and a turn loop that plays two move
//! sources (human, engine, random, or scripted) against each other.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, winning lines, and search scores
//! - [`board`] - Marks, the 3x3 grid, and cell parsing
//! - [`state`] - Move legality, win detection, apply/undo
//! - [`minimax`] - The search engine
//! - [`player`] - Move sources
//! - [`arbiter`] - The turn loop and game outcome
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use tictac_minimax::arbiter::{Arbiter, Outcome};
//! use tictac_minimax::minimax::{EngineConfig, OpeningPolicy};
//! use tictac_minimax::player::Automated;
//!
//! let config = EngineConfig::default().with_opening(OpeningPolicy::FullSearch);
//! let mut x = Automated::new(config);
//! let mut o = Automated::new(config);
//!
//! // Perfect play on both sides always draws.
//! let record = Arbiter::new().play(&mut x, &mut o).unwrap();
//! assert_eq!(record.outcome, Outcome::Draw);
//! ```

pub mod arbiter;
pub mod board;
pub mod constants;
pub mod error;
pub mod minimax;
pub mod player;
pub mod state;

pub use error::{Error, Result};
