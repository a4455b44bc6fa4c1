//! Run Configuration — sectioned key-value file
//!
//! Loads the immutable per-run configuration from a plain text file:
//! `[section]` headers, `name = value` pairs, `#` or `;` comments, blank
//! lines ignored. Keys are addressed fully qualified as `section.name`.
//! Every key is required; a missing or unparsable value is fatal and names
//! the offending key.
//!
//! ## Example
//!
//! ```rust
//! let text = "
//! [snr]
//! start_db = 0.0
//! stop_db = 8.0
//! step_db = 1.0
//! [stopping]
//! min_errors = 100
//! max_bits = 10000000
//! ber_floor = 0.0
//! [io]
//! file = results.csv
//! [rng]
//! seed = 1
//! [model]
//! modem = ask2
//! channel = awgn
//! coder = uncoded
//! frame_len = 1000
//! [ci]
//! level = 0.95
//! abs = 0.0
//! rel = 0.1
//! min_bits = 10000
//! [parallel]
//! threads = 0
//! ";
//! let cfg = bersim_core::Config::parse(text).unwrap();
//! assert_eq!(cfg.modem, "ask2");
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::simulation::StopPolicy;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file cannot be read
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A required key is absent
    #[error("missing required key '{0}'")]
    MissingKey(String),
    /// A value failed to parse as its expected type
    #[error("invalid value for key '{key}': '{value}'")]
    InvalidValue { key: String, value: String },
    /// A value parsed but is outside its allowed range
    #[error("invalid configuration: {0}")]
    OutOfRange(String),
}

/// Immutable per-run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub snr_start_db: f64,
    pub snr_stop_db: f64,
    pub snr_step_db: f64,

    pub min_errors: u64,
    pub max_bits: u64,
    pub ber_floor: f64,

    pub outfile: String,
    pub seed: u64,

    pub modem: String,
    pub channel: String,
    pub coder: String,
    pub frame_len: usize,

    pub ci_level: f64,
    pub ci_abs: f64,
    pub ci_rel: f64,
    pub ci_min_bits: u64,

    pub threads: usize,
}

/// Scan the file into `section.name -> value` pairs.
fn parse_kv(text: &str) -> HashMap<String, String> {
    let mut kv = HashMap::new();
    let mut section = String::new();
    for raw in text.lines() {
        let line = match raw.find(|c| c == '#' || c == ';') {
            Some(cut) => &raw[..cut],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        let Some(eq) = line.find('=') else { continue };
        let key = line[..eq].trim();
        let value = line[eq + 1..].trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        let full = if section.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", section, key)
        };
        kv.insert(full, value.to_string());
    }
    kv
}

fn require<'a>(kv: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConfigError> {
    kv.get(key)
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn require_parse<T: std::str::FromStr>(
    kv: &HashMap<String, String>,
    key: &str,
) -> Result<T, ConfigError> {
    let value = require(kv, key)?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl Config {
    /// Load and validate the configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse and validate the configuration from a string.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let kv = parse_kv(text);

        let cfg = Self {
            snr_start_db: require_parse(&kv, "snr.start_db")?,
            snr_stop_db: require_parse(&kv, "snr.stop_db")?,
            snr_step_db: require_parse(&kv, "snr.step_db")?,

            min_errors: require_parse(&kv, "stopping.min_errors")?,
            max_bits: require_parse(&kv, "stopping.max_bits")?,
            ber_floor: require_parse(&kv, "stopping.ber_floor")?,

            outfile: require(&kv, "io.file")?.to_string(),
            seed: require_parse(&kv, "rng.seed")?,

            modem: require(&kv, "model.modem")?.to_string(),
            channel: require(&kv, "model.channel")?.to_string(),
            coder: require(&kv, "model.coder")?.to_string(),
            frame_len: require_parse(&kv, "model.frame_len")?,

            ci_level: require_parse(&kv, "ci.level")?,
            ci_abs: require_parse(&kv, "ci.abs")?,
            ci_rel: require_parse(&kv, "ci.rel")?,
            ci_min_bits: require_parse(&kv, "ci.min_bits")?,

            threads: require_parse(&kv, "parallel.threads")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.snr_step_db <= 0.0 {
            return Err(ConfigError::OutOfRange("snr.step_db must be > 0".into()));
        }
        if self.snr_stop_db < self.snr_start_db {
            return Err(ConfigError::OutOfRange(
                "snr.stop_db must be >= snr.start_db".into(),
            ));
        }
        if self.ber_floor < 0.0 {
            return Err(ConfigError::OutOfRange(
                "stopping.ber_floor must be >= 0".into(),
            ));
        }
        if self.frame_len == 0 {
            return Err(ConfigError::OutOfRange("model.frame_len must be > 0".into()));
        }
        if !(self.ci_level > 0.0 && self.ci_level < 1.0) {
            return Err(ConfigError::OutOfRange(
                "ci.level must be in (0, 1)".into(),
            ));
        }
        if self.ci_abs < 0.0 || self.ci_rel < 0.0 {
            return Err(ConfigError::OutOfRange(
                "ci.abs and ci.rel must be >= 0".into(),
            ));
        }
        Ok(())
    }

    /// The stopping policy slice of this configuration.
    pub fn stop_policy(&self) -> StopPolicy {
        StopPolicy {
            min_errors: self.min_errors,
            max_bits: self.max_bits,
            ber_floor: self.ber_floor,
            ci_level: self.ci_level,
            ci_abs: self.ci_abs,
            ci_rel: self.ci_rel,
            ci_min_bits: self.ci_min_bits,
        }
    }
}
