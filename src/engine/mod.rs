//! Engine module: the N×N board state machine.
//!
//! - `Board` owns the grid, the move counter and the empty-cell cache.
//! - `Direction` is the command fed in from outside; `Direction::from_key`
//!   is the key lookup the front-ends use.
//! - Line compaction and neighbour scans live in `ops` to keep `state` tidy.

mod ops;
pub mod state;

pub use state::{Board, BoardError, Direction, MoveResult, Position, Score, Slide};

pub use ops::{collapse_line, LineSlide};

/// Canonical side length of a board.
pub const DEFAULT_SIZE: usize = 4;
