//! Packed-buffer marshalling.
//!
//! Matrices cross the memory interface in wire format: row-major, 32
//! elements per 512-bit word. This module converts between element
//! matrices and wire buffers, and builds the stream layout the A reader
//! consumes.

use crate::word::Word;
use crate::{Elem, WORD_ELEMS};

/// Packs a row-major element matrix into wire format.
pub fn pack_matrix(elems: &[Elem]) -> Vec<Word> {
    debug_assert_eq!(elems.len() % WORD_ELEMS, 0);
    elems
        .chunks_exact(WORD_ELEMS)
        .map(|chunk| Word::pack(chunk.try_into().unwrap()))
        .collect()
}

/// Unpacks a wire buffer back into a row-major element matrix.
pub fn unpack_matrix(words: &[Word]) -> Vec<Elem> {
    let mut elems = Vec::with_capacity(words.len() * WORD_ELEMS);
    for word in words {
        elems.extend_from_slice(&word.unpack());
    }
    elems
}

/// Repacks A into the layout the stream reader consumes.
///
/// Each reduction step multiplies one element of A against a full tile row
/// of B, and the M elements of A it needs across the step belong to one
/// *column* of A. Columns are not contiguous in row-major wire format, so
/// they cannot be fetched as whole packed words; this one-time transpose
/// makes them contiguous and lets the reader fetch word-by-word like the B
/// side does.
pub fn pack_stream_a(a: &[Word], n: usize) -> Vec<Word> {
    let elems = unpack_matrix(a);
    let mut transposed = vec![0 as Elem; elems.len()];
    for r in 0..n {
        let row = r * n;
        for c in 0..n {
            transposed[c * n + r] = elems[row + c];
        }
    }
    pack_matrix(&transposed)
}
