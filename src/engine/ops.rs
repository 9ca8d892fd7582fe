use crate::ladder::TileValue;

use super::state::Score;

pub(crate) type Cell = Option<TileValue>;

/// Outcome of collapsing a single row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineSlide {
    pub changed: bool,
    pub score_delta: Score,
}

/// Merge result of two tiles, if they may merge.
///
/// Equal rungs merge one step up the ladder; two `T2048` tiles have nowhere
/// to go and block each other like unequal tiles.
#[inline]
pub(crate) fn merge(a: TileValue, b: TileValue) -> Option<TileValue> {
    if a == b {
        a.next()
    } else {
        None
    }
}

/// Collapse `line` toward index 0 with the two-pointer walk.
///
/// `first` is the slot being filled, `next` scans inward for the next tile:
/// - equal tile: merge into `first`, score the merged value, advance `first`
/// - `first` empty: move the tile into `first` without advancing
/// - otherwise: move the tile to the slot right after `first`, advance `first`
///
/// Callers collapsing toward the far end pass the line in reverse order.
///
/// ```
/// use tilemerge::engine::collapse_line;
/// use tilemerge::ladder::TileValue::*;
/// let mut line = [Some(T2), Some(T2), Some(T4), None];
/// let slide = collapse_line(&mut line);
/// assert_eq!(line, [Some(T4), Some(T4), None, None]);
/// assert_eq!(slide.score_delta, 4);
/// ```
pub fn collapse_line(line: &mut [Cell]) -> LineSlide {
    let mut out = LineSlide::default();
    let mut first = 0;
    let mut next = 1;
    while next < line.len() {
        let Some(incoming) = line[next] else {
            next += 1;
            continue;
        };
        match line[first] {
            None => {
                line[first] = Some(incoming);
                line[next] = None;
                out.changed = true;
            }
            Some(target) => match merge(target, incoming) {
                Some(merged) => {
                    line[first] = Some(merged);
                    line[next] = None;
                    out.score_delta += Score::from(merged.value());
                    out.changed = true;
                    first += 1;
                }
                None => {
                    // Everything strictly between `first` and `next` is empty.
                    let slot = first + 1;
                    if slot != next {
                        line.swap(slot, next);
                        out.changed = true;
                    }
                    first += 1;
                }
            },
        }
        next += 1;
    }
    out
}

/// Row-major indices of line `line`, ordered from the collapse edge inward.
pub(crate) fn line_indices(size: usize, line: usize, toward_zero: bool, by_column: bool) -> Vec<usize> {
    let at = |pos: usize| if by_column { pos * size + line } else { line * size + pos };
    if toward_zero {
        (0..size).map(at).collect()
    } else {
        (0..size).rev().map(at).collect()
    }
}

/// True if any two 4-adjacent cells hold tiles that could merge.
///
/// Checking the right and lower neighbour of every cell covers all pairs.
pub(crate) fn has_merge_pair(cells: &[Cell], size: usize) -> bool {
    for row in 0..size {
        for col in 0..size {
            let Some(here) = cells[row * size + col] else { continue };
            let right = (col + 1 < size).then(|| cells[row * size + col + 1]).flatten();
            let below = (row + 1 < size).then(|| cells[(row + 1) * size + col]).flatten();
            if [right, below].into_iter().flatten().any(|n| merge(here, n).is_some()) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::TileValue::*;

    fn line(values: &[u32]) -> Vec<Cell> {
        values.iter().map(|&v| TileValue::from_value(v)).collect()
    }

    fn values(cells: &[Cell]) -> Vec<u32> {
        cells.iter().map(|c| c.map_or(0, TileValue::value)).collect()
    }

    fn collapse(values_in: &[u32]) -> (Vec<u32>, LineSlide) {
        let mut cells = line(values_in);
        let slide = collapse_line(&mut cells);
        (values(&cells), slide)
    }

    #[test]
    fn it_collapse_line() {
        assert_eq!(collapse(&[0, 0, 0, 0]).0, vec![0, 0, 0, 0]);
        assert_eq!(collapse(&[2, 4, 2, 4]).0, vec![2, 4, 2, 4]);
        assert_eq!(collapse(&[2, 2, 4, 4]).0, vec![4, 8, 0, 0]);
        assert_eq!(collapse(&[2, 0, 0, 2]).0, vec![4, 0, 0, 0]);
        assert_eq!(collapse(&[0, 0, 0, 2]).0, vec![2, 0, 0, 0]);
        assert_eq!(collapse(&[2, 2, 2, 0]).0, vec![4, 2, 0, 0]);
        assert_eq!(collapse(&[2, 2, 2, 2]).0, vec![4, 4, 0, 0]);
        assert_eq!(collapse(&[4, 4, 8, 8]).0, vec![8, 16, 0, 0]);
    }

    #[test]
    fn merged_tile_does_not_merge_again() {
        let (out, slide) = collapse(&[2, 2, 4, 0]);
        assert_eq!(out, vec![4, 4, 0, 0]);
        assert_eq!(slide.score_delta, 4);
        assert!(slide.changed);
    }

    #[test]
    fn blocked_tile_moves_next_to_first() {
        let (out, slide) = collapse(&[2, 0, 0, 4]);
        assert_eq!(out, vec![2, 4, 0, 0]);
        assert_eq!(slide.score_delta, 0);
        assert!(slide.changed);
    }

    #[test]
    fn packed_unequal_line_is_unchanged() {
        let (out, slide) = collapse(&[2, 4, 8, 16]);
        assert_eq!(out, vec![2, 4, 8, 16]);
        assert_eq!(slide, LineSlide::default());
    }

    #[test]
    fn score_is_sum_of_merged_values() {
        let (_, slide) = collapse(&[8, 8, 2, 2]);
        assert_eq!(slide.score_delta, 16 + 4);
    }

    #[test]
    fn top_rung_pair_does_not_merge() {
        let (out, slide) = collapse(&[2048, 2048, 0, 0]);
        assert_eq!(out, vec![2048, 2048, 0, 0]);
        assert!(!slide.changed);
        assert_eq!(merge(T2048, T2048), None);
        assert_eq!(merge(T1024, T1024), Some(T2048));
    }

    #[test]
    fn merge_conserves_line_sum() {
        for input in [[2, 2, 0, 0], [4, 0, 4, 2], [2, 2, 2, 2], [8, 8, 16, 16]] {
            let before: u32 = input.iter().sum();
            let (out, _) = collapse(&input);
            assert_eq!(out.iter().sum::<u32>(), before, "{input:?}");
        }
    }

    #[test]
    fn line_indices_follow_direction() {
        assert_eq!(line_indices(4, 1, true, false), vec![4, 5, 6, 7]);
        assert_eq!(line_indices(4, 1, false, false), vec![7, 6, 5, 4]);
        assert_eq!(line_indices(4, 2, true, true), vec![2, 6, 10, 14]);
        assert_eq!(line_indices(4, 2, false, true), vec![14, 10, 6, 2]);
    }

    #[test]
    fn it_has_merge_pair() {
        let checker = line(&[2, 4, 4, 2]);
        assert!(!has_merge_pair(&checker, 2));
        let vertical = line(&[2, 4, 2, 8]);
        assert!(has_merge_pair(&vertical, 2));
        let gaps = line(&[2, 0, 0, 2]);
        assert!(!has_merge_pair(&gaps, 2));
    }
}
