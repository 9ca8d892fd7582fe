//! Bounded top-K score store backed by a plain text file.
//!
//! File format: one non-negative integer per line, highest first, no header.
//! The store keeps the K largest scores it has ever been offered; a min-heap
//! keeps the current floor at hand so each insert is `O(log K)`.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::engine::Score;

/// Default number of scores kept.
pub const LEADERBOARD_SIZE: usize = 10;

/// Default backing file name.
pub const LEADERBOARD_FILE: &str = "leaderboard.txt";

#[derive(thiserror::Error, Debug)]
pub enum LeaderboardError {
    #[error("io error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("{}:{line}: invalid score {text:?}", path.display())]
    Parse { path: PathBuf, line: usize, text: String },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// What to do with a line of the backing file that is not a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptLinePolicy {
    /// Log a warning and keep loading.
    #[default]
    Skip,
    /// Stop and report `LeaderboardError::Parse`.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardOptions {
    pub capacity: usize,
    pub on_corrupt: CorruptLinePolicy,
}

impl Default for LeaderboardOptions {
    fn default() -> Self {
        Self { capacity: LEADERBOARD_SIZE, on_corrupt: CorruptLinePolicy::Skip }
    }
}

/// Find `file_name` under `root`, or create it empty at `root/file_name`.
///
/// The shallowest match wins, ties broken by path, so the same tree always
/// resolves to the same file. Hidden directories and `target/` are not
/// searched.
pub fn resolve_backing_path<P: AsRef<Path>>(root: P, file_name: &str) -> Result<PathBuf, LeaderboardError> {
    let root = root.as_ref();
    let direct = root.join(file_name);
    if direct.is_file() {
        return Ok(direct);
    }
    let found = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == file_name)
        .min_by_key(|e| (e.depth(), e.path().to_path_buf()))
        .map(|e| e.into_path());

    match found {
        Some(path) => Ok(path),
        None => {
            let path = root.join(file_name);
            ensure_file(&path)?;
            Ok(path)
        }
    }
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with('.') || name == "target")
}

fn ensure_file(path: &Path) -> Result<(), LeaderboardError> {
    if path.exists() {
        return Ok(());
    }
    info!("creating leaderboard file {}", path.display());
    fs::File::create(path)
        .map(|_| ())
        .map_err(|source| LeaderboardError::Io { path: path.to_path_buf(), source })
}

/// The K highest scores seen, bound to one backing file.
///
/// Construct one at startup and hand it to whatever submits scores; two
/// live stores on the same file will overwrite each other.
#[derive(Debug)]
pub struct Leaderboard {
    scores: BinaryHeap<Reverse<Score>>,
    path: PathBuf,
    options: LeaderboardOptions,
}

impl Leaderboard {
    /// Bind to `path` (creating it if missing) and load its scores.
    ///
    /// ```
    /// use tilemerge::leaderboard::{Leaderboard, LeaderboardOptions};
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("leaderboard.txt");
    /// let mut board = Leaderboard::open(&path, LeaderboardOptions::default()).unwrap();
    /// board.submit_score(5).unwrap();
    /// board.submit_score(3).unwrap();
    /// assert_eq!(std::fs::read_to_string(&path).unwrap(), "5\n3\n");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, options: LeaderboardOptions) -> Result<Self, LeaderboardError> {
        let path = path.as_ref().to_path_buf();
        ensure_file(&path)?;
        let mut board = Leaderboard {
            scores: BinaryHeap::with_capacity(options.capacity + 1),
            path,
            options,
        };
        board.load()?;
        Ok(board)
    }

    /// Resolve the backing file under `root` (see `resolve_backing_path`) and open it.
    pub fn discover<P: AsRef<Path>>(
        root: P,
        file_name: &str,
        options: LeaderboardOptions,
    ) -> Result<Self, LeaderboardError> {
        let path = resolve_backing_path(root, file_name)?;
        info!("leaderboard bound to {}", path.display());
        Self::open(path, options)
    }

    /// Replace the in-memory scores with the backing file's contents.
    ///
    /// Every line goes through `insert`; blank lines are ignored. Returns
    /// how many lines were accepted.
    pub fn load(&mut self) -> Result<usize, LeaderboardError> {
        self.scores.clear();
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                ensure_file(&self.path)?;
                return Ok(0);
            }
            Err(source) => return Err(LeaderboardError::Io { path: self.path.clone(), source }),
        };

        let mut accepted = 0;
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| LeaderboardError::Io { path: self.path.clone(), source })?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            match text.parse::<Score>() {
                Ok(score) => {
                    if self.insert(score) {
                        accepted += 1;
                    }
                }
                Err(_) => match self.options.on_corrupt {
                    CorruptLinePolicy::Skip => {
                        warn!("{}:{}: skipping invalid score {:?}", self.path.display(), idx + 1, text);
                    }
                    CorruptLinePolicy::Abort => {
                        return Err(LeaderboardError::Parse {
                            path: self.path.clone(),
                            line: idx + 1,
                            text: text.to_string(),
                        });
                    }
                },
            }
        }
        Ok(accepted)
    }

    /// Bounded insert: keep `score` if there is room or it beats the current
    /// minimum (evicting that minimum). Returns whether it was kept.
    pub fn insert(&mut self, score: Score) -> bool {
        if self.options.capacity == 0 {
            return false;
        }
        if self.scores.len() < self.options.capacity {
            self.scores.push(Reverse(score));
            return true;
        }
        match self.scores.peek() {
            Some(&Reverse(min)) if score > min => {
                self.scores.pop();
                self.scores.push(Reverse(score));
                true
            }
            _ => false,
        }
    }

    /// Offer `score` and rewrite the backing file with the current set.
    ///
    /// The file is written to a sibling temp file and renamed into place.
    pub fn submit_score(&mut self, score: Score) -> Result<bool, LeaderboardError> {
        let kept = self.insert(score);
        info!("submitted score {} ({})", score, if kept { "kept" } else { "not high enough" });
        self.persist()?;
        Ok(kept)
    }

    fn persist(&self) -> Result<(), LeaderboardError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| LeaderboardError::Write { path: self.path.clone(), source })?;
        }
        let tmp = temp_path(&self.path);
        let write = || -> io::Result<()> {
            let mut f = fs::File::create(&tmp)?;
            for score in self.scores() {
                writeln!(f, "{score}")?;
            }
            f.sync_all()?;
            fs::rename(&tmp, &self.path)
        };
        write().map_err(|source| {
            let _ = fs::remove_file(&tmp);
            LeaderboardError::Write { path: self.path.clone(), source }
        })
    }

    /// Stored scores, highest first.
    pub fn scores(&self) -> Vec<Score> {
        let mut out: Vec<Score> = self.scores.iter().map(|&Reverse(s)| s).collect();
        out.sort_unstable_by(|a, b| b.cmp(a));
        out
    }

    /// Lowest stored score, if any.
    pub fn min(&self) -> Option<Score> {
        self.scores.peek().map(|&Reverse(s)| s)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.options.capacity
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ranked listing padded with zero-point lines up to capacity.
    ///
    /// The padding is display-only and never written back.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

/// Sibling of `path` with `.tmp` appended to the full file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scores = self.scores();
        for rank in 1..=self.options.capacity.max(scores.len()) {
            let score = scores.get(rank - 1).copied().unwrap_or(0);
            writeln!(f, "{rank}.    {score} points")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(path: &Path) -> Leaderboard {
        Leaderboard::open(path, LeaderboardOptions::default()).unwrap()
    }

    #[test]
    fn open_creates_missing_file() {
        let td = tempdir().unwrap();
        let path = td.path().join("leaderboard.txt");
        let board = open(&path);
        assert!(path.exists());
        assert!(board.is_empty());
    }

    #[test]
    fn render_pads_to_capacity() {
        let td = tempdir().unwrap();
        let mut board = open(&td.path().join("leaderboard.txt"));
        board.submit_score(5).unwrap();
        board.submit_score(3).unwrap();

        let rendered = board.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "1.    5 points");
        assert_eq!(lines[1], "2.    3 points");
        for (i, line) in lines.iter().enumerate().skip(2) {
            assert_eq!(*line, format!("{}.    0 points", i + 1));
        }
        // Padding never reaches the file.
        assert_eq!(fs::read_to_string(board.path()).unwrap(), "5\n3\n");
    }

    #[test]
    fn full_board_rejects_scores_at_or_below_minimum() {
        let td = tempdir().unwrap();
        let mut board = open(&td.path().join("leaderboard.txt"));
        for s in 1..=10 {
            assert!(board.insert(s));
        }
        assert!(!board.submit_score(0).unwrap());
        assert!(!board.submit_score(1).unwrap());
        assert_eq!(board.scores(), (1..=10).rev().collect::<Vec<_>>());
        assert_eq!(board.min(), Some(1));
    }

    #[test]
    fn higher_score_evicts_minimum() {
        let td = tempdir().unwrap();
        let mut board = open(&td.path().join("leaderboard.txt"));
        for s in 1..=10 {
            board.insert(s);
        }
        assert!(board.submit_score(42).unwrap());
        assert_eq!(board.len(), 10);
        assert_eq!(board.min(), Some(2));
        assert_eq!(board.scores()[0], 42);
    }

    #[test]
    fn keeps_top_k_of_any_sequence() {
        let td = tempdir().unwrap();
        let mut board = open(&td.path().join("leaderboard.txt"));
        let offered: Vec<Score> = (0..100).map(|i| (i * 37) % 101).collect();
        let mut rejected = Vec::new();
        for &s in &offered {
            if !board.insert(s) {
                rejected.push(s);
            }
        }
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        let mut expected = offered.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        expected.truncate(LEADERBOARD_SIZE);
        assert_eq!(board.scores(), expected);
        let floor = board.min().unwrap();
        assert!(rejected.iter().all(|&r| r <= floor));
    }

    #[test]
    fn duplicates_are_kept() {
        let td = tempdir().unwrap();
        let mut board = open(&td.path().join("leaderboard.txt"));
        board.submit_score(7).unwrap();
        board.submit_score(7).unwrap();
        assert_eq!(board.scores(), vec![7, 7]);
    }

    #[test]
    fn round_trip_through_file() {
        let td = tempdir().unwrap();
        let path = td.path().join("leaderboard.txt");
        let mut first = open(&path);
        for s in [120, 4, 880, 16, 16, 2048, 0, 36, 512, 64, 8, 1000] {
            first.submit_score(s).unwrap();
        }
        let second = open(&path);
        assert_eq!(second.scores(), first.scores());
        assert_eq!(second.render(), first.render());
        assert_eq!(second.len(), 10);
    }

    #[test]
    fn load_ignores_blank_lines_and_caps_oversized_files() {
        let td = tempdir().unwrap();
        let path = td.path().join("leaderboard.txt");
        let body: String = (1..=15).map(|s| format!("{s}\n\n")).collect();
        fs::write(&path, body).unwrap();
        let board = open(&path);
        assert_eq!(board.scores(), (6..=15).rev().collect::<Vec<_>>());
    }

    #[test]
    fn corrupt_lines_are_skipped_by_default() {
        let td = tempdir().unwrap();
        let path = td.path().join("leaderboard.txt");
        fs::write(&path, "10\nnot a score\n -3\n 20 \n").unwrap();
        let board = open(&path);
        assert_eq!(board.scores(), vec![20, 10]);
    }

    #[test]
    fn corrupt_lines_abort_when_asked() {
        let td = tempdir().unwrap();
        let path = td.path().join("leaderboard.txt");
        fs::write(&path, "10\nbogus\n").unwrap();
        let options = LeaderboardOptions { on_corrupt: CorruptLinePolicy::Abort, ..Default::default() };
        let err = Leaderboard::open(&path, options).unwrap_err();
        match err {
            LeaderboardError::Parse { line, text, .. } => {
                assert_eq!(line, 2);
                assert_eq!(text, "bogus");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unwritable_target_reports_write_error() {
        let td = tempdir().unwrap();
        let path = td.path().join("leaderboard.txt");
        let mut board = open(&path);
        // Replace the file with a directory so the rename cannot land.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupant"), "x").unwrap();
        let err = board.submit_score(5).unwrap_err();
        assert!(matches!(err, LeaderboardError::Write { .. }), "{err:?}");
    }

    #[test]
    fn resolve_finds_nested_file() {
        let td = tempdir().unwrap();
        let nested = td.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(LEADERBOARD_FILE), "99\n").unwrap();

        let path = resolve_backing_path(td.path(), LEADERBOARD_FILE).unwrap();
        assert_eq!(path, nested.join(LEADERBOARD_FILE));

        let board = Leaderboard::discover(td.path(), LEADERBOARD_FILE, LeaderboardOptions::default()).unwrap();
        assert_eq!(board.scores(), vec![99]);
    }

    #[test]
    fn resolve_prefers_shallowest_match() {
        let td = tempdir().unwrap();
        let nested = td.path().join("a");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(LEADERBOARD_FILE), "1\n").unwrap();
        fs::write(td.path().join(LEADERBOARD_FILE), "2\n").unwrap();
        let path = resolve_backing_path(td.path(), LEADERBOARD_FILE).unwrap();
        assert_eq!(path, td.path().join(LEADERBOARD_FILE));

        fs::remove_file(&path).unwrap();
        let deeper = td.path().join("b").join("c");
        fs::create_dir_all(&deeper).unwrap();
        fs::write(deeper.join(LEADERBOARD_FILE), "3\n").unwrap();
        let path = resolve_backing_path(td.path(), LEADERBOARD_FILE).unwrap();
        assert_eq!(path, nested.join(LEADERBOARD_FILE));
    }

    #[test]
    fn resolve_skips_hidden_and_target_dirs() {
        let td = tempdir().unwrap();
        for dir in [".git", "target"] {
            let d = td.path().join(dir);
            fs::create_dir_all(&d).unwrap();
            fs::write(d.join(LEADERBOARD_FILE), "5\n").unwrap();
        }
        let path = resolve_backing_path(td.path(), LEADERBOARD_FILE).unwrap();
        assert_eq!(path, td.path().join(LEADERBOARD_FILE));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn reload_does_not_duplicate_scores() {
        let td = tempdir().unwrap();
        let mut board = open(&td.path().join("leaderboard.txt"));
        board.submit_score(5).unwrap();
        board.submit_score(3).unwrap();
        assert_eq!(board.load().unwrap(), 2);
        assert_eq!(board.scores(), vec![5, 3]);
        board.load().unwrap();
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn tmp_named_backing_file_is_rewritten_in_place() {
        let td = tempdir().unwrap();
        let path = td.path().join("scores.tmp");
        let mut board = open(&path);
        board.submit_score(11).unwrap();
        assert_eq!(temp_path(&path), td.path().join("scores.tmp.tmp"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "11\n");
        assert!(!temp_path(&path).exists());
        assert_eq!(open(&path).scores(), vec![11]);
    }

    #[test]
    fn resolve_creates_file_at_root_when_absent() {
        let td = tempdir().unwrap();
        let path = resolve_backing_path(td.path(), LEADERBOARD_FILE).unwrap();
        assert_eq!(path, td.path().join(LEADERBOARD_FILE));
        assert!(path.is_file());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn custom_capacity() {
        let td = tempdir().unwrap();
        let options = LeaderboardOptions { capacity: 3, ..Default::default() };
        let mut board = Leaderboard::open(td.path().join("lb.txt"), options).unwrap();
        for s in [5, 1, 9, 7] {
            board.submit_score(s).unwrap();
        }
        assert_eq!(board.scores(), vec![9, 7, 5]);
        assert_eq!(board.render().lines().count(), 3);
    }
}
