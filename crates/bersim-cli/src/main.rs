//! Configuration-driven BER curve runner.
//!
//! Loads the sectioned key-value configuration (path given as the first
//! argument, default `config.ini`), builds the modem/channel/coder set,
//! sweeps the SNR grid and writes one CSV record plus one progress line per
//! point. Exit code 0 on success, 2 when the output file cannot be written,
//! 1 for any other fatal error.

use std::path::Path;
use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bersim_core::report::CsvReport;
use bersim_core::{channel, coder, modem, report, resolve_seed, run_sweep, Config, Error};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal: {err}");
            match err {
                Error::Output { .. } => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run() -> bersim_core::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.ini".to_string());
    let cfg = Config::load_from(Path::new(&config_path))?;

    let modem = modem::from_name(&cfg.modem)?;
    let channel = channel::from_name(&cfg.channel)?;
    let coder = coder::from_name(&cfg.coder)?;

    let seed = resolve_seed(cfg.seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let threads = if cfg.threads == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        cfg.threads
    };
    println!("Using {} threads", threads);

    let out_path = report::resolve_output_path(&cfg.outfile, &cfg.coder, &cfg.modem, &cfg.channel)?;
    let mut csv = CsvReport::create(&out_path)?;
    println!("Saving results to: {}", out_path.display());
    info!(config = %config_path, seed, "starting sweep");

    run_sweep(
        &cfg,
        modem.as_ref(),
        channel.as_ref(),
        coder.as_ref(),
        &mut rng,
        |snr_db, r| {
            csv.write_point(snr_db, r)?;
            println!(
                "SNR(dB)={:6.2}  BER={:.6}  bits={}  errors={}",
                snr_db, r.ber, r.bits, r.errs
            );
            Ok(())
        },
    )?;

    csv.finish()?;
    Ok(())
}
