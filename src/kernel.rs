//! Rank-1 accumulator update kernels.
//!
//! One reduction step contributes `a[i] * b[j]` to every accumulator cell.
//! All `M`×`M` updates of a step touch disjoint cells, so the parallel
//! variant hands whole accumulator rows to the rayon pool.

use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use crate::{Elem, M};

/// Applies one rank-1 update to the row-major `M`×`M` accumulator:
/// `acc[i][j] += a[i] * b[j]`, wrapping on overflow.
pub fn rank1_update(acc: &mut [Elem], a: &[Elem; M], b: &[Elem; M]) {
    debug_assert_eq!(acc.len(), M * M);
    for (row, &ai) in acc.chunks_exact_mut(M).zip(a.iter()) {
        for (cell, &bj) in row.iter_mut().zip(b.iter()) {
            *cell = cell.wrapping_add(ai.wrapping_mul(bj));
        }
    }
}

/// Same update with accumulator rows fanned out across the rayon pool.
/// Each row is owned by exactly one task, so the result is bit-identical
/// to [`rank1_update`].
pub fn par_rank1_update(acc: &mut [Elem], a: &[Elem; M], b: &[Elem; M]) {
    debug_assert_eq!(acc.len(), M * M);
    acc.par_chunks_exact_mut(M)
        .enumerate()
        .for_each(|(i, row)| {
            let ai = a[i];
            for (cell, &bj) in row.iter_mut().zip(b.iter()) {
                *cell = cell.wrapping_add(ai.wrapping_mul(bj));
            }
        });
}
