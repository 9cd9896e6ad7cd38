//! The pipeline stages.
//!
//! Every stage is a plain function run on its own thread, connected to its
//! neighbors only through bounded channels. Each one re-derives the same
//! [`TileWalk`] order locally; a stage never reorders the sequence, it only
//! overlaps its own segment of it with the others in time.
//!
//! Readers address operand buffers in whole packed words and read every
//! word exactly once per step that needs it; regions revisited for a later
//! tile are fetched again rather than cached.

use std::sync::mpsc::{Receiver, SyncSender};

use log::trace;

use crate::kernel::{par_rank1_update, rank1_update};
use crate::tile::{TileStep, TileWalk};
use crate::word::Word;
use crate::{Elem, M, TILE_ROW_WORDS, WORD_ELEMS};

/// Streams the packed words of A for each reduction step.
///
/// `a` must be in stream layout (see [`crate::pack::pack_stream_a`]); for
/// step `(ib, kb, k)` the reader emits the [`TILE_ROW_WORDS`] words holding
/// elements `ib*M .. ib*M+M` of stream row `kb*M + k`, in ascending order.
pub fn read_a(a: &[Word], n: usize, tx: SyncSender<Word>) {
    trace!("reader-a: start (n = {n})");
    let row_words = n / WORD_ELEMS;
    for step in TileWalk::new(n).steps() {
        if let TileStep::Reduce { ib, kb, k, .. } = step {
            let base = (kb * M + k) * row_words + ib * M / WORD_ELEMS;
            for ii in 0..TILE_ROW_WORDS {
                tx.send(a[base + ii]).unwrap();
            }
        }
    }
    trace!("reader-a: done");
}

/// Streams the packed words of B for each reduction step: for
/// `(jb, kb, k)` the words holding elements `jb*M .. jb*M+M` of B row
/// `kb*M + k`, in ascending order.
pub fn read_b(b: &[Word], n: usize, tx: SyncSender<Word>) {
    trace!("reader-b: start (n = {n})");
    let row_words = n / WORD_ELEMS;
    for step in TileWalk::new(n).steps() {
        if let TileStep::Reduce { jb, kb, k, .. } = step {
            let base = (kb * M + k) * row_words + jb * M / WORD_ELEMS;
            for jj in 0..TILE_ROW_WORDS {
                tx.send(b[base + jj]).unwrap();
            }
        }
    }
    trace!("reader-b: done");
}

/// Rate converter between reader-a and the compute stage.
///
/// Unpacks each incoming word and re-emits its 32 elements one at a time,
/// in packing order, so compute can broadcast A element-wise while B stays
/// packed.
pub fn convert_a(rx: Receiver<Word>, tx: SyncSender<Elem>) {
    trace!("rate-converter: start");
    for word in rx.iter() {
        for elem in word.unpack() {
            tx.send(elem).unwrap();
        }
    }
    trace!("rate-converter: done");
}

/// The compute stage: owns the `M`×`M` accumulator and performs every
/// multiply-accumulate in the pipeline.
///
/// Per reduction step it consumes exactly `M` individual A elements and
/// [`TILE_ROW_WORDS`] packed B words, then applies one rank-1 update. When
/// a tile finishes, the accumulator is packed row-major and drained to the
/// writer, left to right, top to bottom.
pub fn compute(
    a_rx: Receiver<Elem>,
    b_rx: Receiver<Word>,
    ab_tx: SyncSender<Word>,
    n: usize,
    parallel: bool,
) {
    trace!("compute: start (n = {n}, parallel = {parallel})");
    let mut acc = vec![0 as Elem; M * M];
    let mut a_row = [0 as Elem; M];
    let mut b_row = [0 as Elem; M];
    for step in TileWalk::new(n).steps() {
        match step {
            TileStep::Start { .. } => acc.fill(0),
            TileStep::Reduce { .. } => {
                for elem in a_row.iter_mut() {
                    *elem = a_rx.recv().unwrap();
                }
                for jj in 0..TILE_ROW_WORDS {
                    let word = b_rx.recv().unwrap();
                    b_row[jj * WORD_ELEMS..(jj + 1) * WORD_ELEMS]
                        .copy_from_slice(&word.unpack());
                }
                if parallel {
                    par_rank1_update(&mut acc, &a_row, &b_row);
                } else {
                    rank1_update(&mut acc, &a_row, &b_row);
                }
            }
            TileStep::Finish { ib, jb } => {
                trace!("compute: tile ({ib}, {jb}) done");
                for row in acc.chunks_exact(M) {
                    for chunk in row.chunks_exact(WORD_ELEMS) {
                        ab_tx.send(Word::pack(chunk.try_into().unwrap())).unwrap();
                    }
                }
            }
        }
    }
    trace!("compute: done");
}

/// The writer: stores each finished word at its wire-format offset in the
/// output buffer. Pure sink, no transformation.
pub fn write_ab(rx: Receiver<Word>, ab: &mut [Word], n: usize) {
    trace!("writer: start (n = {n})");
    let row_words = n / WORD_ELEMS;
    for (ib, jb) in TileWalk::new(n).tiles() {
        for i in 0..M {
            let base = (ib * M + i) * row_words + jb * M / WORD_ELEMS;
            for jj in 0..TILE_ROW_WORDS {
                ab[base + jj] = rx.recv().unwrap();
            }
        }
    }
    trace!("writer: done");
}
