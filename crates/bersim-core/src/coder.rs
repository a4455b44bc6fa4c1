//! Forward Error Correction — uncoded passthrough and convolutional coding
//!
//! The convolutional code is the industry-standard rate-1/2 constraint
//! length 7 code (generators 133/171 octal) used by deep-space links, DVB-S
//! and 802.11a, decoded with a hard-decision Viterbi decoder. Frames are
//! zero-terminated so every codeword starts and ends in the all-zero state,
//! which anchors the traceback.
//!
//! ## Example
//!
//! ```rust
//! use bersim_core::coder::{Coder, ConvK7};
//!
//! let coder = ConvK7::new();
//! let u = vec![true, false, true, true, false, false, true, false];
//! let mut c = Vec::new();
//! coder.encode(&u, &mut c);
//! assert_eq!(c.len(), 2 * (u.len() + 6));
//!
//! let mut decoded = Vec::new();
//! coder.decode(&c, &mut decoded);
//! assert_eq!(decoded, u);
//! ```

use crate::error::{Error, Result};

/// Channel coder: expands information bits into coded bits and recovers
/// them from hard decisions (or LLRs, for soft-capable implementations).
pub trait Coder: Send + Sync {
    /// Encode information bits into `c` (cleared first).
    fn encode(&self, u: &[bool], c: &mut Vec<bool>);
    /// Decode hard channel decisions into `u_hat` (cleared first).
    fn decode(&self, c_hat: &[bool], u_hat: &mut Vec<bool>);
    /// Decode channel LLRs. Only meaningful when `supports_soft()`.
    fn decode_soft(&self, _llr: &[f64], u_hat: &mut Vec<bool>) {
        u_hat.clear();
    }
    /// Code rate (information bits per coded bit).
    fn rate(&self) -> f64;
    /// Whether the decoder consumes LLRs instead of hard decisions.
    fn supports_soft(&self) -> bool {
        false
    }
}

/// Identity coder for uncoded reference curves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncoded;

impl Coder for Uncoded {
    fn encode(&self, u: &[bool], c: &mut Vec<bool>) {
        c.clear();
        c.extend_from_slice(u);
    }

    fn decode(&self, c_hat: &[bool], u_hat: &mut Vec<bool>) {
        u_hat.clear();
        u_hat.extend_from_slice(c_hat);
    }

    fn rate(&self) -> f64 {
        1.0
    }
}

/// Generator polynomials in octal, newest register bit in the LSB.
const G0: u32 = 0o133;
const G1: u32 = 0o171;
/// Encoder memory: constraint length 7 minus the current input bit.
const MEMORY: usize = 6;
/// Trellis states: 2^MEMORY.
const NSTATE: usize = 1 << MEMORY;
const STATE_MASK: u32 = (NSTATE as u32) - 1;
const REG_MASK: u32 = (1 << (MEMORY + 1)) - 1;

fn parity(x: u32) -> bool {
    x.count_ones() & 1 == 1
}

/// One trellis branch: successor state and the coded bit pair it emits.
#[derive(Debug, Clone, Copy)]
struct Branch {
    next: usize,
    out: [bool; 2],
}

/// Rate-1/2, K=7 convolutional coder with hard-decision Viterbi decoding.
///
/// The branch table is precomputed once per instance; per-frame trellis
/// storage (path metrics, survivors, decisions) is allocated per decode
/// call and never shared between threads.
#[derive(Debug, Clone)]
pub struct ConvK7 {
    /// branches[state][input] for all 64 states and both input bits.
    branches: Vec<[Branch; 2]>,
}

impl Default for ConvK7 {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvK7 {
    pub fn new() -> Self {
        let mut branches = Vec::with_capacity(NSTATE);
        for state in 0..NSTATE {
            let mut pair = [Branch {
                next: 0,
                out: [false; 2],
            }; 2];
            for (input, branch) in pair.iter_mut().enumerate() {
                let reg = (((state as u32) << 1) | input as u32) & REG_MASK;
                *branch = Branch {
                    next: (reg & STATE_MASK) as usize,
                    out: [parity(reg & G0), parity(reg & G1)],
                };
            }
            branches.push(pair);
        }
        Self { branches }
    }
}

impl Coder for ConvK7 {
    fn encode(&self, u: &[bool], c: &mut Vec<bool>) {
        c.clear();
        c.reserve(2 * (u.len() + MEMORY));
        let mut sr: u32 = 0;
        let mut push = |bit: bool, c: &mut Vec<bool>| {
            sr = ((sr << 1) | bit as u32) & REG_MASK;
            c.push(parity(sr & G0));
            c.push(parity(sr & G1));
        };
        for &bit in u {
            push(bit, c);
        }
        // Zero-termination flushes the register back to state 0
        for _ in 0..MEMORY {
            push(false, c);
        }
    }

    fn decode(&self, c_hat: &[bool], u_hat: &mut Vec<bool>) {
        let n_sym = c_hat.len() / 2;
        u_hat.clear();
        if n_sym == 0 {
            return;
        }

        let mut pm_prev = vec![u32::MAX; NSTATE];
        let mut pm_curr = vec![u32::MAX; NSTATE];
        // Flat n_sym x NSTATE survivor tables
        let mut pred = vec![0u8; n_sym * NSTATE];
        let mut dec = vec![false; n_sym * NSTATE];
        pm_prev[0] = 0;

        for t in 0..n_sym {
            let r = [c_hat[2 * t], c_hat[2 * t + 1]];
            pm_curr.fill(u32::MAX);
            for state in 0..NSTATE {
                let pm = pm_prev[state];
                if pm == u32::MAX {
                    continue;
                }
                for (input, branch) in self.branches[state].iter().enumerate() {
                    let dist =
                        (branch.out[0] != r[0]) as u32 + (branch.out[1] != r[1]) as u32;
                    let candidate = pm.saturating_add(dist);
                    if candidate < pm_curr[branch.next] {
                        pm_curr[branch.next] = candidate;
                        pred[t * NSTATE + branch.next] = state as u8;
                        dec[t * NSTATE + branch.next] = input == 1;
                    }
                }
            }
            std::mem::swap(&mut pm_prev, &mut pm_curr);
        }

        // Zero-termination means the transmitted path ends in state 0;
        // the last MEMORY decisions are the flush bits and are dropped.
        let n_info = n_sym.saturating_sub(MEMORY);
        u_hat.resize(n_info, false);
        let mut state = 0usize;
        for t in (0..n_sym).rev() {
            if t < n_info {
                u_hat[t] = dec[t * NSTATE + state];
            }
            state = pred[t * NSTATE + state] as usize;
        }
    }

    fn rate(&self) -> f64 {
        0.5
    }
}

/// Build a coder from its configuration name (case-insensitive).
pub fn from_name(name: &str) -> Result<Box<dyn Coder>> {
    match name.to_ascii_lowercase().as_str() {
        "uncoded" => Ok(Box::new(Uncoded)),
        "conv_k7_r12" => Ok(Box::new(ConvK7::new())),
        _ => Err(Error::UnknownComponent {
            kind: "coder",
            name: name.to_string(),
        }),
    }
}
