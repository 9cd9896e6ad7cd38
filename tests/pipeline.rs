//! End-to-end scenarios for the packed, pipelined multiply.

use rand::prelude::*;

use tilepipe::blocked::mm_blocked;
use tilepipe::pack::{pack_matrix, unpack_matrix};
use tilepipe::reference::matmul_reference;
use tilepipe::word::Word;
use tilepipe::{mm, packed_len, par_mm, Elem, M};

fn random_matrix(n: usize, rng: &mut StdRng) -> Vec<Elem> {
    (0..n * n).map(|_| rng.random_range(-64..64)).collect()
}

/// Packs the inputs, runs `f`, unpacks the product.
fn run_packed(
    a: &[Elem],
    b: &[Elem],
    n: usize,
    f: impl Fn(&[Word], &[Word], &mut [Word], usize) -> tilepipe::Result<()>,
) -> Vec<Elem> {
    let mut ab = vec![Word::ZERO; packed_len(n)];
    f(&pack_matrix(a), &pack_matrix(b), &mut ab, n).unwrap();
    unpack_matrix(&ab)
}

#[test]
fn matches_reference_multi_tile() {
    let n = 2 * M;
    let mut rng = StdRng::seed_from_u64(42);
    let a = random_matrix(n, &mut rng);
    let b = random_matrix(n, &mut rng);

    assert_eq!(run_packed(&a, &b, n, mm), matmul_reference(&a, &b, n));
}

#[test]
fn all_ones_512() {
    // Every inner product sums 512 ones; 512 fits the element type.
    let n = 2 * M;
    let ones = vec![1; n * n];

    let ab = run_packed(&ones, &ones, n, mm);
    assert!(ab.iter().all(|&e| e == 512));
}

#[test]
fn identity_times_b_single_tile() {
    let n = M;
    let mut id = vec![0; n * n];
    for i in 0..n {
        id[i * n + i] = 1;
    }
    let mut rng = StdRng::seed_from_u64(7);
    let b = random_matrix(n, &mut rng);

    assert_eq!(run_packed(&id, &b, n, mm), b);
}

#[test]
fn zero_operand_zeroes_every_tile() {
    let n = 2 * M;
    let zeros = vec![0; n * n];
    let mut rng = StdRng::seed_from_u64(11);
    let other = random_matrix(n, &mut rng);

    // Output buffer starts dirty so all-zero results prove every tile was
    // actually stored.
    let dirty = [-1; 32];
    let mut ab = vec![Word::pack(&dirty); packed_len(n)];
    mm(&pack_matrix(&zeros), &pack_matrix(&other), &mut ab, n).unwrap();
    assert!(unpack_matrix(&ab).iter().all(|&e| e == 0));

    let mut ab = vec![Word::pack(&dirty); packed_len(n)];
    mm(&pack_matrix(&other), &pack_matrix(&zeros), &mut ab, n).unwrap();
    assert!(unpack_matrix(&ab).iter().all(|&e| e == 0));
}

#[test]
fn deterministic_across_runs() {
    let n = M;
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_matrix(n, &mut rng);
    let b = random_matrix(n, &mut rng);

    let first = run_packed(&a, &b, n, mm);
    let second = run_packed(&a, &b, n, mm);
    assert_eq!(first, second);
}

#[test]
fn wrapping_accumulation_matches_reference() {
    // Large magnitudes overflow the 16-bit accumulator early and often.
    let n = M;
    let mut rng = StdRng::seed_from_u64(13);
    let a: Vec<Elem> = (0..n * n).map(|_| rng.random()).collect();
    let b: Vec<Elem> = (0..n * n).map(|_| rng.random()).collect();

    assert_eq!(run_packed(&a, &b, n, mm), matmul_reference(&a, &b, n));
}

#[test]
fn variants_agree_bit_for_bit() {
    let n = M;
    let mut rng = StdRng::seed_from_u64(17);
    let a = random_matrix(n, &mut rng);
    let b = random_matrix(n, &mut rng);

    let pipelined = run_packed(&a, &b, n, mm);
    let parallel = run_packed(&a, &b, n, par_mm);
    let blocked = run_packed(&a, &b, n, mm_blocked);

    assert_eq!(pipelined, parallel);
    assert_eq!(pipelined, blocked);
}

#[test]
fn blocked_matches_reference_multi_tile() {
    let n = 2 * M;
    let mut rng = StdRng::seed_from_u64(19);
    let a = random_matrix(n, &mut rng);
    let b = random_matrix(n, &mut rng);

    assert_eq!(
        run_packed(&a, &b, n, mm_blocked),
        matmul_reference(&a, &b, n)
    );
}
