//! Engine error types

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a simulation run
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file missing, unparsable or out of range
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Output file or its directory cannot be created or written
    #[error("cannot write output file {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Component name did not match any known implementation
    #[error("unknown {kind} '{name}'")]
    UnknownComponent { kind: &'static str, name: String },

    /// A worker thread died mid-point; totals cover the frames finished
    /// before the failure
    #[error("worker thread failed at {snr_db} dB (partial totals: {bits} bits, {errs} errors)")]
    WorkerFailed { snr_db: f64, bits: u64, errs: u64 },
}
