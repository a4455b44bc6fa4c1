//! Measured vs. closed-form 2-ASK/AWGN BER over a small grid.
//!
//! ```bash
//! cargo run --release --example quick_sweep
//! ```

use bersim_core::channel::Awgn;
use bersim_core::coder::Uncoded;
use bersim_core::modem::Ask2;
use bersim_core::{simulate_point, stats, StopPolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    let policy = StopPolicy::fixed_bits(200_000);
    let mut rng = StdRng::seed_from_u64(1);

    println!("{:>8} {:>12} {:>12}", "SNR(dB)", "measured", "theory");
    for snr_db in 0..=8 {
        let r = simulate_point(
            snr_db as f64,
            1_000,
            0,
            &policy,
            &Ask2,
            &Awgn,
            &Uncoded,
            &mut rng,
        )
        .expect("simulation failed");
        let theory = stats::ask2_awgn_ber(10f64.powf(snr_db as f64 / 10.0));
        println!("{:>8} {:>12.6} {:>12.6}", snr_db, r.ber, theory);
    }
}
