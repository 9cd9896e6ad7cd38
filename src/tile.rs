//! The fixed iteration order every pipeline stage follows.
//!
//! Output tiles are visited row-major (`ib`, then `jb`); inside a tile the
//! reduction runs over `kb`, then `k`, always ascending. The order is
//! load-bearing: it decides which operand rows travel the channels at each
//! step, and keeps accumulation bit-identical with the plain triple loop.

use std::iter;

use crate::M;

/// One step of the walk over the output index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStep {
    /// A fresh output tile begins; the accumulator must be zeroed.
    Start { ib: usize, jb: usize },
    /// One reduction step: operand row `kb * M + k` feeds the rank-1 update.
    Reduce {
        ib: usize,
        jb: usize,
        kb: usize,
        k: usize,
    },
    /// The tile is complete; the accumulator is ready to drain.
    Finish { ib: usize, jb: usize },
}

/// Enumerates tiles and reduction steps for one `n`×`n` run.
///
/// Every stage derives its loop structure from this walk; stages overlap
/// segments of the sequence in time but never reorder it.
#[derive(Debug, Clone, Copy)]
pub struct TileWalk {
    blocks: usize,
}

impl TileWalk {
    /// Walk for an `n`×`n` multiply, `n` a positive multiple of [`M`].
    pub fn new(n: usize) -> Self {
        debug_assert!(n > 0 && n % M == 0);
        TileWalk { blocks: n / M }
    }

    /// Tiles per matrix edge.
    pub fn blocks(self) -> usize {
        self.blocks
    }

    /// Output tiles in the order the writer stores them.
    pub fn tiles(self) -> impl Iterator<Item = (usize, usize)> {
        let blocks = self.blocks;
        (0..blocks).flat_map(move |ib| (0..blocks).map(move |jb| (ib, jb)))
    }

    /// The full event stream: for each tile one [`TileStep::Start`], then
    /// `blocks * M` [`TileStep::Reduce`] steps in ascending `(kb, k)` order,
    /// then one [`TileStep::Finish`].
    pub fn steps(self) -> impl Iterator<Item = TileStep> {
        let blocks = self.blocks;
        self.tiles().flat_map(move |(ib, jb)| {
            iter::once(TileStep::Start { ib, jb })
                .chain((0..blocks).flat_map(move |kb| {
                    (0..M).map(move |k| TileStep::Reduce { ib, jb, kb, k })
                }))
                .chain(iter::once(TileStep::Finish { ib, jb }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_order_row_major() {
        let tiles: Vec<_> = TileWalk::new(2 * M).tiles().collect();
        assert_eq!(tiles, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_step_counts() {
        let walk = TileWalk::new(2 * M);
        let steps: Vec<_> = walk.steps().collect();
        // 4 tiles, each: Start + 2 * M reduce steps + Finish.
        assert_eq!(steps.len(), 4 * (2 * M + 2));

        let starts = steps
            .iter()
            .filter(|s| matches!(s, TileStep::Start { .. }))
            .count();
        let finishes = steps
            .iter()
            .filter(|s| matches!(s, TileStep::Finish { .. }))
            .count();
        assert_eq!(starts, 4);
        assert_eq!(finishes, 4);
    }

    #[test]
    fn test_start_precedes_reduce_precedes_finish() {
        let mut open = None;
        for step in TileWalk::new(2 * M).steps() {
            match step {
                TileStep::Start { ib, jb } => {
                    assert_eq!(open, None);
                    open = Some((ib, jb));
                }
                TileStep::Reduce { ib, jb, .. } => {
                    assert_eq!(open, Some((ib, jb)));
                }
                TileStep::Finish { ib, jb } => {
                    assert_eq!(open, Some((ib, jb)));
                    open = None;
                }
            }
        }
        assert_eq!(open, None);
    }

    #[test]
    fn test_reduction_order_ascending() {
        let walk = TileWalk::new(2 * M);
        let reduces: Vec<_> = walk
            .steps()
            .filter_map(|s| match s {
                TileStep::Reduce { ib, jb, kb, k } if (ib, jb) == (0, 0) => Some((kb, k)),
                _ => None,
            })
            .collect();
        assert_eq!(reduces.len(), 2 * M);
        assert_eq!(reduces[0], (0, 0));
        assert_eq!(reduces[M - 1], (0, M - 1));
        assert_eq!(reduces[M], (1, 0));
        assert!(reduces.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_single_block_walk() {
        let walk = TileWalk::new(M);
        assert_eq!(walk.blocks(), 1);
        assert_eq!(walk.tiles().count(), 1);
        assert_eq!(walk.steps().count(), M + 2);
    }
}
