//! tilemerge: a 2048-style tile-merging engine with a persistent leaderboard
//!
//! This crate provides:
//! - The value ladder of tile rungs (`ladder` module)
//! - An N×N `Board` state machine with slide/merge/spawn rules (`engine` module)
//! - A bounded top-K score store backed by a text file (`leaderboard` module)
//! - Game sessions with traditional, time-trial and move-limit modes (`game` module)
//! - TOML configuration for the binaries (`config` module)
//!
//! Quick start:
//! ```
//! use tilemerge::engine::{Board, Direction};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut board = Board::new(4, &mut rng).unwrap();
//! let result = board.apply_move(Direction::Left, &mut rng);
//! assert!(result.changed || board.empty_count() == 14);
//! ```
//!
//! All randomness goes through a caller-supplied `Rng`; pass a seeded
//! `StdRng` when you need reproducible games.
pub mod config;
pub mod engine;
pub mod game;
pub mod ladder;
pub mod leaderboard;
