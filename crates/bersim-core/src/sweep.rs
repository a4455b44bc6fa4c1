//! SNR Sweep — walk the Eb/N0 grid with floor-based early exit
//!
//! Iterates the inclusive dB grid low to high, running one Monte-Carlo
//! point per step. Once a point's stopping BER (Wilson upper bound when
//! available, else the estimate) falls under the configured floor, the
//! remaining higher-SNR points are skipped: they could only report rates
//! further below the floor.

use rand::rngs::StdRng;
use tracing::info;

use crate::channel::Channel;
use crate::coder::Coder;
use crate::config::Config;
use crate::error::Result;
use crate::modem::Modem;
use crate::simulation::{simulate_point, BerResult};

/// Inclusive dB grid: start, start+step, ..., stop.
pub fn snr_grid(start_db: f64, stop_db: f64, step_db: f64) -> Vec<f64> {
    let n = (((stop_db - start_db) / step_db) + 0.5).floor() as i64 + 1;
    (0..n.max(0)).map(|i| start_db + i as f64 * step_db).collect()
}

/// One measured grid point.
#[derive(Debug, Clone, Copy)]
pub struct SweepPoint {
    pub snr_db: f64,
    pub result: BerResult,
}

/// Run the full sweep described by `cfg` over the given components.
///
/// `on_point` is invoked once per finished point, in sweep order, before
/// the floor check; report writers hook in here. The master generator is
/// consumed for one base draw per point.
pub fn run_sweep<F>(
    cfg: &Config,
    modem: &dyn Modem,
    channel: &dyn Channel,
    coder: &dyn Coder,
    rng: &mut StdRng,
    mut on_point: F,
) -> Result<Vec<SweepPoint>>
where
    F: FnMut(f64, &BerResult) -> Result<()>,
{
    let policy = cfg.stop_policy();
    let grid = snr_grid(cfg.snr_start_db, cfg.snr_stop_db, cfg.snr_step_db);
    let mut points = Vec::with_capacity(grid.len());

    for snr_db in grid {
        let result = simulate_point(
            snr_db,
            cfg.frame_len,
            cfg.threads,
            &policy,
            modem,
            channel,
            coder,
            rng,
        )?;
        on_point(snr_db, &result)?;
        points.push(SweepPoint { snr_db, result });

        let ber_for_stop = if result.ci_hi > 0.0 {
            result.ci_hi
        } else {
            result.ber
        };
        if cfg.ber_floor > 0.0 && ber_for_stop <= cfg.ber_floor {
            info!(snr_db, ber_for_stop, "error-rate floor reached, ending sweep early");
            break;
        }
    }

    Ok(points)
}
