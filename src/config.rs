//! TOML configuration shared by the binaries.
//!
//! Every key is optional; a missing file section falls back to the
//! defaults below.
//!
//! ```toml
//! [board]
//! size = 4
//!
//! [game]
//! mode = "move_limit"
//! move_limit = 1000
//! time_limit_s = 900
//!
//! [leaderboard]
//! file_name = "leaderboard.txt"
//! search_root = "."
//! capacity = 10
//! on_corrupt = "skip"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::game::{GameMode, Limits};
use crate::leaderboard::{CorruptLinePolicy, LeaderboardOptions};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "defaults::size")]
    pub size: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default = "defaults::move_limit")]
    pub move_limit: u32,
    #[serde(default = "defaults::time_limit_s")]
    pub time_limit_s: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "defaults::file_name")]
    pub file_name: String,
    /// Directory searched recursively for `file_name`.
    #[serde(default = "defaults::search_root")]
    pub search_root: PathBuf,
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub on_corrupt: CorruptLinePolicy,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self { size: defaults::size() }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            move_limit: defaults::move_limit(),
            time_limit_s: defaults::time_limit_s(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            file_name: defaults::file_name(),
            search_root: defaults::search_root(),
            capacity: defaults::capacity(),
            on_corrupt: CorruptLinePolicy::default(),
        }
    }
}

impl Config {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.size < 2 {
            return Err(ConfigError::Invalid(format!("board.size must be at least 2, got {}", self.board.size)));
        }
        if self.leaderboard.capacity == 0 {
            return Err(ConfigError::Invalid("leaderboard.capacity must be at least 1".into()));
        }
        if self.game.move_limit == 0 {
            return Err(ConfigError::Invalid("game.move_limit must be at least 1".into()));
        }
        if self.game.time_limit_s == 0 {
            return Err(ConfigError::Invalid("game.time_limit_s must be at least 1".into()));
        }
        if self.leaderboard.file_name.trim().is_empty() {
            return Err(ConfigError::Invalid("leaderboard.file_name is empty".into()));
        }
        Ok(())
    }

    pub fn limits(&self) -> Limits {
        Limits {
            moves: self.game.move_limit,
            time: Duration::from_secs(self.game.time_limit_s),
        }
    }

    pub fn leaderboard_options(&self) -> LeaderboardOptions {
        LeaderboardOptions {
            capacity: self.leaderboard.capacity,
            on_corrupt: self.leaderboard.on_corrupt,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn size() -> usize { crate::engine::DEFAULT_SIZE }
    pub fn move_limit() -> u32 { crate::game::DEFAULT_MOVE_LIMIT }
    pub fn time_limit_s() -> u64 { crate::game::DEFAULT_TIME_LIMIT.as_secs() }
    pub fn file_name() -> String { crate::leaderboard::LEADERBOARD_FILE.to_string() }
    pub fn search_root() -> PathBuf { PathBuf::from(".") }
    pub fn capacity() -> usize { crate::leaderboard::LEADERBOARD_SIZE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.board.size, 4);
        assert_eq!(cfg.game.mode, GameMode::Traditional);
        assert_eq!(cfg.limits(), Limits::default());
        assert_eq!(cfg.leaderboard_options(), LeaderboardOptions::default());
        assert_eq!(cfg.leaderboard.file_name, "leaderboard.txt");
    }

    #[test]
    fn parses_all_sections() {
        let cfg = Config::from_toml_str(
            r#"
            [board]
            size = 5

            [game]
            mode = "move_limit"
            move_limit = 50

            [leaderboard]
            file_name = "scores.txt"
            search_root = "/tmp/scores"
            capacity = 3
            on_corrupt = "abort"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.board.size, 5);
        assert_eq!(cfg.game.mode, GameMode::MoveLimit);
        assert_eq!(cfg.limits().moves, 50);
        assert_eq!(cfg.limits().time, Duration::from_secs(900));
        assert_eq!(cfg.leaderboard.search_root, PathBuf::from("/tmp/scores"));
        assert_eq!(cfg.leaderboard_options().capacity, 3);
        assert_eq!(cfg.leaderboard_options().on_corrupt, CorruptLinePolicy::Abort);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(Config::from_toml_str("[board]\nsize = 1"), Err(ConfigError::Invalid(_))));
        assert!(matches!(Config::from_toml_str("[leaderboard]\ncapacity = 0"), Err(ConfigError::Invalid(_))));
        assert!(matches!(Config::from_toml_str("[game]\nmode = \"blitz\""), Err(ConfigError::Toml(_))));
        assert!(matches!(Config::from_toml_str("[game]\nmove_limit = 0"), Err(ConfigError::Invalid(_))));
        assert!(matches!(Config::from_toml_str("[game]\ntime_limit_s = 0"), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let td = tempfile::tempdir().unwrap();
        let err = Config::from_toml(td.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
