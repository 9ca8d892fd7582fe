//! The tile ladder: the finite, ordered set of values a cell may hold.
//!
//! Values come from an explicit table rather than shift arithmetic, so asking
//! for the rung above `T2048` yields `None` instead of reading past the end.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric value of every rung, indexed by rung.
pub const LADDER: [u32; 11] = [2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048];

/// Probability that a freshly spawned tile is the lowest rung.
pub const LOW_SPAWN_CHANCE: f64 = 0.75;

/// One rung of the ladder (2, 4, 8, ..., 2048).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileValue {
    T2,
    T4,
    T8,
    T16,
    T32,
    T64,
    T128,
    T256,
    T512,
    T1024,
    T2048,
}

impl TileValue {
    /// Every rung in ascending order.
    pub const ALL: [TileValue; 11] = [
        TileValue::T2,
        TileValue::T4,
        TileValue::T8,
        TileValue::T16,
        TileValue::T32,
        TileValue::T64,
        TileValue::T128,
        TileValue::T256,
        TileValue::T512,
        TileValue::T1024,
        TileValue::T2048,
    ];

    pub const MIN: TileValue = TileValue::T2;
    pub const MAX: TileValue = TileValue::T2048;

    /// Position of this rung on the ladder, `0..LADDER.len()`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<TileValue> {
        Self::ALL.get(index).copied()
    }

    /// Numeric value of the rung, e.g. `T64.value() == 64`.
    #[inline]
    pub fn value(self) -> u32 {
        LADDER[self.index()]
    }

    /// The rung one step up, or `None` on the last rung.
    ///
    /// ```
    /// use tilemerge::ladder::TileValue;
    /// assert_eq!(TileValue::T2.next(), Some(TileValue::T4));
    /// assert_eq!(TileValue::T2048.next(), None);
    /// ```
    #[inline]
    pub fn next(self) -> Option<TileValue> {
        Self::from_index(self.index() + 1)
    }

    /// Look a numeric value up on the ladder. Only exact rungs match.
    pub fn from_value(value: u32) -> Option<TileValue> {
        LADDER
            .iter()
            .position(|&v| v == value)
            .and_then(Self::from_index)
    }

    /// Draw a spawn value: 75% `T2`, 25% `T4`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> TileValue {
        if rng.gen_bool(LOW_SPAWN_CHANCE) {
            TileValue::T2
        } else {
            TileValue::T4
        }
    }
}

impl fmt::Display for TileValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl From<TileValue> for u32 {
    fn from(t: TileValue) -> Self {
        t.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn values_double_each_rung() {
        for pair in TileValue::ALL.windows(2) {
            assert_eq!(pair[0].value() * 2, pair[1].value());
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(TileValue::MIN.value(), 2);
        assert_eq!(TileValue::MAX.value(), 2048);
    }

    #[test]
    fn last_rung_has_no_next() {
        assert_eq!(TileValue::T2048.next(), None);
        assert_eq!(TileValue::from_index(LADDER.len()), None);
    }

    #[test]
    fn from_value_matches_only_rungs() {
        assert_eq!(TileValue::from_value(2), Some(TileValue::T2));
        assert_eq!(TileValue::from_value(1024), Some(TileValue::T1024));
        assert_eq!(TileValue::from_value(0), None);
        assert_eq!(TileValue::from_value(3), None);
        assert_eq!(TileValue::from_value(4096), None);
    }

    #[test]
    fn display_prints_numeric_value() {
        assert_eq!(TileValue::T256.to_string(), "256");
    }

    #[test]
    fn random_spawns_low_rungs_mostly_twos() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut twos = 0;
        for _ in 0..4000 {
            match TileValue::random(&mut rng) {
                TileValue::T2 => twos += 1,
                TileValue::T4 => {}
                other => panic!("unexpected spawn {other}"),
            }
        }
        // 75% expected; wide margin keeps this stable across rand versions.
        assert!((2700..3300).contains(&twos), "twos = {twos}");
    }
}
