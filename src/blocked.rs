//! Single-threaded tiled multiply over packed buffers.
//!
//! Same tiling, wire format and wrapping semantics as the pipelined entry,
//! executed as one loop nest on the calling thread: no channels, no stage
//! overlap. Useful as a baseline and as an independent implementation for
//! cross-checking.

use crate::error::{check_args, Result};
use crate::kernel::rank1_update;
use crate::pack::pack_stream_a;
use crate::tile::{TileStep, TileWalk};
use crate::word::Word;
use crate::{Elem, M, TILE_ROW_WORDS, WORD_ELEMS};

/// Computes `AB = A × B` over packed wire-format buffers, without the
/// streaming pipeline. Bit-identical to [`crate::mm`].
///
/// # Errors
///
/// Same argument checks as [`crate::mm`].
pub fn mm_blocked(a: &[Word], b: &[Word], ab: &mut [Word], n: usize) -> Result<()> {
    check_args(a.len(), b.len(), ab.len(), n)?;
    let a_stream = pack_stream_a(a, n);
    let row_words = n / WORD_ELEMS;

    let mut acc = vec![0 as Elem; M * M];
    let mut a_row = [0 as Elem; M];
    let mut b_row = [0 as Elem; M];

    for step in TileWalk::new(n).steps() {
        match step {
            TileStep::Start { .. } => acc.fill(0),
            TileStep::Reduce { ib, jb, kb, k } => {
                let a_base = (kb * M + k) * row_words + ib * M / WORD_ELEMS;
                let b_base = (kb * M + k) * row_words + jb * M / WORD_ELEMS;
                for w in 0..TILE_ROW_WORDS {
                    a_row[w * WORD_ELEMS..(w + 1) * WORD_ELEMS]
                        .copy_from_slice(&a_stream[a_base + w].unpack());
                    b_row[w * WORD_ELEMS..(w + 1) * WORD_ELEMS]
                        .copy_from_slice(&b[b_base + w].unpack());
                }
                rank1_update(&mut acc, &a_row, &b_row);
            }
            TileStep::Finish { ib, jb } => {
                for (i, row) in acc.chunks_exact(M).enumerate() {
                    let base = (ib * M + i) * row_words + jb * M / WORD_ELEMS;
                    for (jj, chunk) in row.chunks_exact(WORD_ELEMS).enumerate() {
                        ab[base + jj] = Word::pack(chunk.try_into().unwrap());
                    }
                }
            }
        }
    }
    Ok(())
}
