//! # BER Simulation Engine
//!
//! Monte-Carlo estimation of digital link bit-error rates across a grid of
//! signal-to-noise ratios. For each Eb/N0 point the engine generates random
//! information bits, runs them through an encoder → modulator → channel →
//! equalizer → demodulator → decoder pipeline on parallel workers, counts
//! bit errors, and reports a point estimate with a Wilson confidence
//! interval.
//!
//! ## Signal flow
//!
//! ```text
//! info bits → encoder → modulator → channel → equalizer → demapper → decoder → error count
//! ```
//!
//! The driving loop is adaptive: each SNR point runs until a hard bit
//! budget, an error-rate floor, or the configured confidence-interval
//! targets are reached, and the sweep itself exits early once a point
//! falls below the floor.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bersim_core::channel::Awgn;
//! use bersim_core::coder::Uncoded;
//! use bersim_core::modem::Ask2;
//! use bersim_core::{simulate_point, StopPolicy};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let policy = StopPolicy::fixed_bits(1_000_000);
//! let r = simulate_point(4.0, 1_000, 0, &policy, &Ask2, &Awgn, &Uncoded, &mut rng)?;
//! println!("BER {:.2e} ({} errors / {} bits)", r.ber, r.errs, r.bits);
//! # Ok::<(), bersim_core::Error>(())
//! ```

pub mod channel;
pub mod coder;
pub mod config;
pub mod error;
pub mod modem;
pub mod report;
pub mod simulation;
pub mod stats;
pub mod sweep;

pub use config::Config;
pub use error::{Error, Result};
pub use simulation::{simulate_point, BerResult, StopPolicy};
pub use sweep::{run_sweep, snr_grid, SweepPoint};

/// Resolve the run seed: a nonzero request is used as-is, 0 synthesizes a
/// seed from the clock and the OS entropy source.
pub fn resolve_seed(requested: u64) -> u64 {
    use rand::RngCore;

    if requested != 0 {
        return requested;
    }
    let clock = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    clock ^ (rand::rngs::OsRng.next_u64() << 1)
}
