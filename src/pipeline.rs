//! Channel wiring and the synchronous entry points.
//!
//! `mm` and `par_mm` run the five stages on scoped threads:
//!
//! ```text
//! reader-a ──words──▶ rate-converter ──elems──▶ compute ──words──▶ writer
//! reader-b ──────────────────words────────────▶
//! ```
//!
//! Each arrow is a bounded FIFO with a single producer and a single
//! consumer; blocking on a full or empty channel is the only
//! synchronization in the system. A call returns once the writer has
//! stored the last word of the last tile.

use std::sync::mpsc;
use std::thread;

use log::debug;

use crate::error::{check_args, Result};
use crate::pack::pack_stream_a;
use crate::stage;
use crate::tile::TileWalk;
use crate::word::Word;
use crate::{M, WORD_ELEMS};

/// Capacity, in words, of the three word channels. A throughput tunable,
/// not a correctness parameter: enough for a few tile rows in flight so a
/// reader can run ahead of compute.
const WORD_CHANNEL_DEPTH: usize = 4 * (M / WORD_ELEMS);

/// Capacity of the element channel between the rate converter and compute.
const ELEM_CHANNEL_DEPTH: usize = 2 * M;

/// Computes `AB = A × B` over packed wire-format buffers.
///
/// All three buffers are row-major packed matrices of `n*n / 32` words,
/// `n` a positive multiple of [`M`]; `ab` is fully populated when the call
/// returns. Accumulation wraps modulo 2^16 and matches the plain triple
/// loop bit for bit.
///
/// # Errors
///
/// Returns an error if `n` is zero or not a multiple of [`M`], or if any
/// buffer length differs from `n*n / 32`.
pub fn mm(a: &[Word], b: &[Word], ab: &mut [Word], n: usize) -> Result<()> {
    run(a, b, ab, n, false)
}

/// [`mm`] with the rank-1 update fanned out across the rayon pool.
///
/// Same contract and bit-identical output; worth it when tiles are large
/// enough for the per-step fan-out to pay for itself.
pub fn par_mm(a: &[Word], b: &[Word], ab: &mut [Word], n: usize) -> Result<()> {
    run(a, b, ab, n, true)
}

fn run(a: &[Word], b: &[Word], ab: &mut [Word], n: usize, parallel: bool) -> Result<()> {
    check_args(a.len(), b.len(), ab.len(), n)?;
    let blocks = TileWalk::new(n).blocks();
    debug!("mm: n = {n}, {blocks}x{blocks} tiles, parallel = {parallel}");

    let a_stream = pack_stream_a(a, n);
    let a_stream = a_stream.as_slice();

    thread::scope(|s| {
        let (aw_tx, aw_rx) = mpsc::sync_channel(WORD_CHANNEL_DEPTH);
        let (ae_tx, ae_rx) = mpsc::sync_channel(ELEM_CHANNEL_DEPTH);
        let (bw_tx, bw_rx) = mpsc::sync_channel(WORD_CHANNEL_DEPTH);
        let (ab_tx, ab_rx) = mpsc::sync_channel(WORD_CHANNEL_DEPTH);

        s.spawn(move || stage::read_a(a_stream, n, aw_tx));
        s.spawn(move || stage::convert_a(aw_rx, ae_tx));
        s.spawn(move || stage::read_b(b, n, bw_tx));
        s.spawn(move || stage::compute(ae_rx, bw_rx, ab_tx, n, parallel));
        s.spawn(move || stage::write_ab(ab_rx, ab, n));
    });

    debug!("mm: done");
    Ok(())
}
