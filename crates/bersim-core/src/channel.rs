//! Channel Models — per-symbol gain and additive noise
//!
//! Real-valued memoryless channels. AWGN adds the noise directly; the
//! Rayleigh model only applies the fading gain and reports it, leaving the
//! noise to be accounted for after equalization (the pipeline forwards the
//! scaled noise variance to the demapper). Every draw comes from the
//! caller's generator so worker threads stay independent.

use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{Error, Result};

/// One channel use: the received value and the gain to equalize by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelOutput {
    pub y: f64,
    pub gain: f64,
}

/// Memoryless symbol-level channel.
pub trait Channel: Send + Sync {
    /// Pass one symbol through the channel. `sigma` is the per-sample noise
    /// standard deviation derived from the operating Eb/N0.
    fn transmit(&self, s: f64, rng: &mut dyn RngCore, sigma: f64) -> ChannelOutput;
}

/// Additive white Gaussian noise, unit gain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Awgn;

impl Channel for Awgn {
    fn transmit(&self, s: f64, rng: &mut dyn RngCore, sigma: f64) -> ChannelOutput {
        let n: f64 = StandardNormal.sample(rng);
        ChannelOutput {
            y: s + sigma * n,
            gain: 1.0,
        }
    }
}

/// Real-valued Rayleigh fading: gain h = |N(0,1)|, no additive noise here.
///
/// After the pipeline divides by h, the effective noise variance becomes
/// sigma^2 / h^2, which is what the demapper receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rayleigh;

impl Channel for Rayleigh {
    fn transmit(&self, s: f64, rng: &mut dyn RngCore, _sigma: f64) -> ChannelOutput {
        let g: f64 = StandardNormal.sample(rng);
        let h = g.abs();
        ChannelOutput { y: h * s, gain: h }
    }
}

/// Build a channel from its configuration name (case-insensitive).
pub fn from_name(name: &str) -> Result<Box<dyn Channel>> {
    match name.to_ascii_lowercase().as_str() {
        "awgn" => Ok(Box::new(Awgn)),
        "rayleigh" => Ok(Box::new(Rayleigh)),
        _ => Err(Error::UnknownComponent {
            kind: "channel",
            name: name.to_string(),
        }),
    }
}
