//! A single play session: board, running score and the active game mode.
//!
//! The session turns board results into a game-over decision and hands the
//! final score to a `Leaderboard` exactly once.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::engine::{Board, BoardError, Direction, MoveResult, Score};
use crate::leaderboard::{Leaderboard, LeaderboardError};

/// Default move budget in `MoveLimit` mode.
pub const DEFAULT_MOVE_LIMIT: u32 = 1000;

/// Default time budget in `TimeTrial` mode.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Traditional,
    TimeTrial,
    MoveLimit,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Traditional, GameMode::TimeTrial, GameMode::MoveLimit];

    pub fn title(self) -> &'static str {
        match self {
            GameMode::Traditional => "Traditional",
            GameMode::TimeTrial => "Time Trial",
            GameMode::MoveLimit => "Move Limit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameMode::Traditional => "Experience the original challenge",
            GameMode::TimeTrial => "Beat the game within a time limit",
            GameMode::MoveLimit => "Limits the moves you can make",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "traditional" => Ok(GameMode::Traditional),
            "time_trial" => Ok(GameMode::TimeTrial),
            "move_limit" => Ok(GameMode::MoveLimit),
            other => Err(format!("unknown game mode '{other}' (traditional, time-trial, move-limit)")),
        }
    }
}

/// Budgets for the limited modes. Ignored in `Traditional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub moves: u32,
    pub time: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self { moves: DEFAULT_MOVE_LIMIT, time: DEFAULT_TIME_LIMIT }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOver {
    /// Board full with nothing left to merge.
    NoMoves,
    /// Move budget used up.
    OutOfMoves,
    /// Time budget used up.
    OutOfTime,
}

impl fmt::Display for GameOver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GameOver::NoMoves => "no moves left",
            GameOver::OutOfMoves => "out of moves",
            GameOver::OutOfTime => "out of time",
        };
        f.write_str(msg)
    }
}

/// What one command did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub result: MoveResult,
    pub score: Score,
    pub over: Option<GameOver>,
}

pub struct Game {
    board: Board,
    mode: GameMode,
    limits: Limits,
    score: Score,
    best: Score,
    /// Set by the first move that changes the board.
    started: Option<Instant>,
    over: Option<GameOver>,
    submitted: bool,
}

impl Game {
    /// Start a fresh session on a new `size × size` board.
    ///
    /// ```
    /// use tilemerge::engine::Direction;
    /// use tilemerge::game::{Game, GameMode, Limits};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(3);
    /// let mut game = Game::new(4, GameMode::Traditional, Limits::default(), &mut rng).unwrap();
    /// let step = game.step(Direction::Left, &mut rng);
    /// assert_eq!(step.score, game.score());
    /// assert!(step.over.is_none());
    /// ```
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        mode: GameMode,
        limits: Limits,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        Ok(Self::with_board(Board::new(size, rng)?, mode, limits))
    }

    /// Wrap an existing board, e.g. one built with `Board::from_rows`.
    pub fn with_board(board: Board, mode: GameMode, limits: Limits) -> Self {
        Game {
            board,
            mode,
            limits,
            score: 0,
            best: 0,
            started: None,
            over: None,
            submitted: false,
        }
    }

    pub fn step<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R) -> Step {
        self.step_at(direction, rng, Instant::now())
    }

    /// Like `step`, with the clock reading supplied by the caller.
    pub fn step_at<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R, now: Instant) -> Step {
        if self.over.is_none() && self.time_left_at(now) == Some(Duration::ZERO) {
            self.finish(GameOver::OutOfTime);
        }
        if self.over.is_none() && self.remaining_moves() == Some(0) {
            self.finish(GameOver::OutOfMoves);
        }
        if self.over.is_some() {
            return Step { result: MoveResult::default(), score: self.score, over: self.over };
        }

        let result = self.board.apply_move(direction, rng);
        if result.changed && self.started.is_none() {
            self.started = Some(now);
        }
        self.score += result.score_delta;
        self.best = self.best.max(self.score);

        if result.terminal {
            self.finish(GameOver::NoMoves);
        } else if self.remaining_moves() == Some(0) {
            self.finish(GameOver::OutOfMoves);
        }
        Step { result, score: self.score, over: self.over }
    }

    fn finish(&mut self, reason: GameOver) {
        info!(
            "game over ({}): score {} after {} moves in {} mode",
            reason,
            self.score,
            self.board.moves(),
            self.mode
        );
        self.over = Some(reason);
    }

    /// Submit the final score once the game is over.
    ///
    /// Returns `Ok(None)` if the game is still running or was already
    /// submitted, otherwise whether the leaderboard kept the score.
    pub fn finish_into(&mut self, leaderboard: &mut Leaderboard) -> Result<Option<bool>, LeaderboardError> {
        if self.over.is_none() || self.submitted {
            return Ok(None);
        }
        let kept = leaderboard.submit_score(self.score)?;
        self.submitted = true;
        Ok(Some(kept))
    }

    /// New board, zero score, fresh budgets. The best score survives.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.board.reset(rng);
        self.score = 0;
        self.started = None;
        self.over = None;
        self.submitted = false;
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    /// Moves left in `MoveLimit` mode.
    pub fn remaining_moves(&self) -> Option<u32> {
        (self.mode == GameMode::MoveLimit).then(|| self.limits.moves.saturating_sub(self.board.moves()))
    }

    pub fn time_left(&self) -> Option<Duration> {
        self.time_left_at(Instant::now())
    }

    /// Time left in `TimeTrial` mode as of `now`.
    ///
    /// The clock starts with the first move that changes the board.
    pub fn time_left_at(&self, now: Instant) -> Option<Duration> {
        (self.mode == GameMode::TimeTrial).then(|| match self.started {
            Some(started) => self.limits.time.saturating_sub(now.saturating_duration_since(started)),
            None => self.limits.time,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn best(&self) -> Score {
        self.best
    }

    pub fn over(&self) -> Option<GameOver> {
        self.over
    }

    pub fn is_over(&self) -> bool {
        self.over.is_some()
    }

    /// Score to record: the running score, meaningful once the game is over.
    pub fn final_score(&self) -> Score {
        self.score
    }
}
