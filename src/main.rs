//! Demo harness: random matrices through the pipeline, timed and checked
//! against the triple-loop reference.
//!
//! ```bash
//! cargo run --release            # 512 x 512
//! cargo run --release -- 1024    # any positive multiple of 256
//! ```

use std::time::Instant;

use rand::prelude::*;

use tilepipe::pack::{pack_matrix, unpack_matrix};
use tilepipe::reference::matmul_reference;
use tilepipe::word::Word;
use tilepipe::{mm, packed_len, Elem, M};

fn main() {
    let n: usize = std::env::args()
        .nth(1)
        .map(|arg| arg.parse().expect("matrix size must be an integer"))
        .unwrap_or(512);
    assert!(
        n > 0 && n % M == 0,
        "matrix size must be a positive multiple of {M}"
    );

    let mut rng = StdRng::seed_from_u64(42);
    let a: Vec<Elem> = (0..n * n).map(|_| rng.random_range(0..8)).collect();
    let b: Vec<Elem> = (0..n * n).map(|_| rng.random_range(0..8)).collect();

    let a_packed = pack_matrix(&a);
    let b_packed = pack_matrix(&b);
    let mut ab_packed = vec![Word::ZERO; packed_len(n)];

    println!("Running {n}x{n} pipelined multiply...");
    let start = Instant::now();
    mm(&a_packed, &b_packed, &mut ab_packed, n).expect("arguments were validated above");
    let seconds = start.elapsed().as_secs_f64();
    let gops = 2.0 * (n as f64).powi(3) * 1e-9 / seconds;
    println!("Time: {seconds:.3} sec, GOPS: {gops:.2}");

    let ab = unpack_matrix(&ab_packed);
    let expected = matmul_reference(&a, &b, n);

    let mut err_cnt = 0;
    for i in 0..n {
        for j in 0..n {
            if ab[i * n + j] != expected[i * n + j] {
                err_cnt += 1;
                if err_cnt == 1 {
                    println!(
                        "i:{i} j:{j} sw:{} hw:{}",
                        expected[i * n + j],
                        ab[i * n + j]
                    );
                }
            }
        }
    }

    if err_cnt != 0 {
        println!("TEST FAILED! Error count : {err_cnt}");
        std::process::exit(1);
    }
    println!("TEST PASSED!");
}
