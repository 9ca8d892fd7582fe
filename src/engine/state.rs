use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ops::{self, Cell};
use crate::ladder::TileValue;

pub type Score = u64;

/// `(row, col)` of a cell, zero-based.
pub type Position = (usize, usize);

/// A direction to collapse tiles toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Map a raw key name to a direction.
    ///
    /// Accepts WASD (either case) and the arrow key names `Up`, `Down`,
    /// `Left`, `Right`. Anything else is not a command.
    ///
    /// ```
    /// use tilemerge::engine::Direction;
    /// assert_eq!(Direction::from_key("w"), Some(Direction::Up));
    /// assert_eq!(Direction::from_key("Right"), Some(Direction::Right));
    /// assert_eq!(Direction::from_key("x"), None);
    /// ```
    pub fn from_key(key: &str) -> Option<Direction> {
        match key {
            "W" | "w" | "Up" => Some(Direction::Up),
            "S" | "s" | "Down" => Some(Direction::Down),
            "A" | "a" | "Left" => Some(Direction::Left),
            "D" | "d" | "Right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Tiles gather at index 0 of each line (Up, Left).
    #[inline]
    pub fn collapses_toward_zero(self) -> bool {
        matches!(self, Direction::Up | Direction::Left)
    }

    /// Lines are columns rather than rows (Up, Down).
    #[inline]
    pub fn iterates_by_column(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// Result of sliding the grid, before any spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slide {
    pub changed: bool,
    pub score_delta: Score,
}

/// What one direction command did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveResult {
    pub changed: bool,
    pub score_delta: Score,
    pub terminal: bool,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("board side must be at least 2, got {0}")]
    TooSmall(usize),
    #[error("row {row} has {len} cells, expected {size}")]
    NotSquare { row: usize, len: usize, size: usize },
    #[error("value {value} at ({row}, {col}) is not a tile value")]
    InvalidTile { row: usize, col: usize, value: u32 },
}

/// Square grid of optional ladder rungs plus the move counter.
///
/// Cells are stored row-major. The empty-cell list is a cache that is
/// recomputed before every spawn and terminal check, so it takes no part
/// in equality.
#[derive(Clone)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    empty: Vec<usize>,
    moves: u32,
}

impl Board {
    /// Allocate a `size × size` board and seed two distinct random tiles.
    ///
    /// ```
    /// use tilemerge::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let board = Board::new(4, &mut rng).unwrap();
    /// assert_eq!(board.empty_count(), 14);
    /// assert_eq!(board.moves(), 0);
    /// ```
    pub fn new<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Self, BoardError> {
        let mut board = Self::blank(size)?;
        board.seed(rng);
        Ok(board)
    }

    /// An all-empty board. Not a playable start; use `new` for that.
    pub fn blank(size: usize) -> Result<Self, BoardError> {
        if size < 2 {
            return Err(BoardError::TooSmall(size));
        }
        let mut board = Board {
            size,
            cells: vec![None; size * size],
            empty: Vec::with_capacity(size * size),
            moves: 0,
        };
        board.refresh_empty();
        Ok(board)
    }

    /// Build an exact board from numeric rows, `0` meaning empty.
    ///
    /// ```
    /// use tilemerge::engine::Board;
    /// let board = Board::from_rows(vec![vec![2, 0], vec![0, 4]]).unwrap();
    /// assert_eq!(board.to_rows(), vec![vec![2, 0], vec![0, 4]]);
    /// ```
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, BoardError> {
        let size = rows.len();
        let mut board = Self::blank(size)?;
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(BoardError::NotSquare { row, len: values.len(), size });
            }
            for (col, value) in values.into_iter().enumerate() {
                if value == 0 {
                    continue;
                }
                let tile = TileValue::from_value(value)
                    .ok_or(BoardError::InvalidTile { row, col, value })?;
                board.cells[row * size + col] = Some(tile);
            }
        }
        board.refresh_empty();
        Ok(board)
    }

    /// Numeric rows, `0` for empty cells.
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|c| c.map_or(0, TileValue::value)).collect())
            .collect()
    }

    /// Blank every cell, reseed two tiles and zero the move counter.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cells.iter_mut().for_each(|c| *c = None);
        self.seed(rng);
    }

    fn seed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        // The second spawn draws from the cells left empty by the first,
        // so the two seeds always land on distinct cells.
        self.spawn_tile(rng);
        self.spawn_tile(rng);
        self.moves = 0;
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of moves that changed the board since the last reset.
    #[inline]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Tile at `(row, col)`, `None` when empty.
    ///
    /// Panics if the position is outside the board.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Option<TileValue> {
        assert!(row < self.size && col < self.size, "({row}, {col}) outside {0}x{0} board", self.size);
        self.cells[row * self.size + col]
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// Sum of all tile values; only spawns change it.
    pub fn tile_sum(&self) -> Score {
        self.cells.iter().flatten().map(|t| Score::from(t.value())).sum()
    }

    pub fn highest_tile(&self) -> Option<TileValue> {
        self.cells.iter().flatten().copied().max()
    }

    /// Collapse every line toward `direction` without spawning.
    ///
    /// The move counter goes up by one iff something moved or merged.
    pub fn slide(&mut self, direction: Direction) -> Slide {
        let toward_zero = direction.collapses_toward_zero();
        let by_column = direction.iterates_by_column();
        let mut slide = Slide::default();
        let mut line: Vec<Cell> = Vec::with_capacity(self.size);

        for idx in 0..self.size {
            let indices = ops::line_indices(self.size, idx, toward_zero, by_column);
            line.clear();
            line.extend(indices.iter().map(|&i| self.cells[i]));

            let line_slide = ops::collapse_line(&mut line);
            if line_slide.changed {
                for (&i, &cell) in indices.iter().zip(line.iter()) {
                    self.cells[i] = cell;
                }
                slide.changed = true;
                slide.score_delta += line_slide.score_delta;
            }
        }

        if slide.changed {
            self.moves += 1;
        }
        slide
    }

    /// Put a spawn-distribution tile on a uniformly random empty cell.
    ///
    /// Returns where it landed, or `None` if the board was already full.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Position> {
        self.refresh_empty();
        if self.empty.is_empty() {
            return None;
        }
        let pick = self.empty.swap_remove(rng.gen_range(0..self.empty.len()));
        self.cells[pick] = Some(TileValue::random(rng));
        Some((pick / self.size, pick % self.size))
    }

    /// True once the board is full and no neighbouring tiles can merge.
    pub fn is_terminal(&mut self) -> bool {
        self.refresh_empty();
        self.empty.is_empty() && !ops::has_merge_pair(&self.cells, self.size)
    }

    /// Apply one direction command: slide, spawn if anything changed, then
    /// check for the terminal state.
    ///
    /// ```
    /// use tilemerge::engine::{Board, Direction};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let mut board = Board::from_rows(vec![
    ///     vec![2, 2, 4, 0],
    ///     vec![0, 0, 0, 0],
    ///     vec![0, 0, 0, 0],
    ///     vec![0, 0, 0, 0],
    /// ]).unwrap();
    /// let result = board.apply_move(Direction::Left, &mut rng);
    /// assert!(result.changed && !result.terminal);
    /// assert_eq!(result.score_delta, 4);
    /// assert_eq!(board.moves(), 1);
    /// ```
    pub fn apply_move<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R) -> MoveResult {
        let slide = self.slide(direction);
        if slide.changed {
            self.spawn_tile(rng);
        }
        let terminal = self.is_terminal();
        debug!(
            "{:?}: changed={} delta={} terminal={}{}",
            direction, slide.changed, slide.score_delta, terminal, self
        );
        MoveResult { changed: slide.changed, score_delta: slide.score_delta, terminal }
    }

    fn refresh_empty(&mut self) {
        self.empty.clear();
        self.empty
            .extend(self.cells.iter().enumerate().filter(|(_, c)| c.is_none()).map(|(i, _)| i));
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.moves == other.moves && self.cells == other.cells
    }
}

impl Eq for Board {}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("size", &self.size)
            .field("rows", &self.to_rows())
            .field("moves", &self.moves)
            .finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = format!("+{}\n", "----+".repeat(self.size));
        write!(f, "\n{border}")?;
        for row in self.cells.chunks(self.size) {
            write!(f, "|")?;
            for cell in row {
                match cell {
                    Some(tile) => write!(f, "{:>4}|", tile.value())?,
                    None => write!(f, "    |")?,
                }
            }
            write!(f, "\n{border}")?;
        }
        Ok(())
    }
}
