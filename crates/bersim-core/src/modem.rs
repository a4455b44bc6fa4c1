//! Amplitude-Shift-Keying Modems — bit/symbol mapping and demapping
//!
//! Real-valued 2- and 4-level ASK with hard-decision slicing and exact
//! per-bit log-likelihood ratios. The 4-level constellation supports both
//! Gray and natural (binary-counting) labelings so coded and uncoded links
//! can be compared across mappings.
//!
//! LLR sign convention: positive means bit 0 is more likely, matching the
//! soft-decision decoder input convention.
//!
//! ## Example
//!
//! ```rust
//! use bersim_core::modem::{Ask4, Ask4Mapping, Modem};
//!
//! let modem = Ask4::new(Ask4Mapping::Gray);
//! let s = modem.modulate(&[true, true]);
//! let mut bits = Vec::new();
//! modem.demodulate(s, &mut bits);
//! assert_eq!(bits, vec![true, true]);
//! ```

use crate::error::{Error, Result};

/// Bit-to-symbol mapper and its matching demappers.
///
/// `modulate` consumes `bits_per_symbol()` bits (MSB first); the demappers
/// append the same number of bits/LLRs to their output vector.
pub trait Modem: Send + Sync {
    /// Map `bits_per_symbol()` bits to one real symbol.
    fn modulate(&self, bits: &[bool]) -> f64;
    /// Hard-decision demap: append `bits_per_symbol()` bits to `out`.
    fn demodulate(&self, r: f64, out: &mut Vec<bool>);
    /// Soft demap: append `bits_per_symbol()` LLRs to `out` given the noise
    /// variance seen by the symbol.
    fn demodulate_llr(&self, r: f64, sigma2: f64, out: &mut Vec<f64>);
    /// Bits carried per symbol.
    fn bits_per_symbol(&self) -> usize;
    /// Mean symbol energy of the constellation.
    fn symbol_energy(&self) -> f64;
}

/// Binary ASK: bit 0 maps to +1, bit 1 to -1, unit symbol energy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ask2;

impl Modem for Ask2 {
    fn modulate(&self, bits: &[bool]) -> f64 {
        if bits[0] {
            -1.0
        } else {
            1.0
        }
    }

    fn demodulate(&self, r: f64, out: &mut Vec<bool>) {
        out.push(r < 0.0);
    }

    fn demodulate_llr(&self, r: f64, sigma2: f64, out: &mut Vec<f64>) {
        out.push(2.0 * r / sigma2);
    }

    fn bits_per_symbol(&self) -> usize {
        1
    }

    fn symbol_energy(&self) -> f64 {
        1.0
    }
}

/// Bit labeling for the 4-level constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ask4Mapping {
    /// Adjacent symbols differ in exactly one bit: 00 01 11 10.
    Gray,
    /// Binary counting order: 00 01 10 11.
    Natural,
}

/// Constellation points in slicing order.
const ASK4_POINTS: [f64; 4] = [-3.0, -1.0, 1.0, 3.0];

/// Bit pairs per constellation point, indexed by [mapping][point].
const ASK4_LABELS: [[(bool, bool); 4]; 2] = [
    // Gray: -3 -> 00, -1 -> 01, +1 -> 11, +3 -> 10
    [
        (false, false),
        (false, true),
        (true, true),
        (true, false),
    ],
    // Natural: -3 -> 00, -1 -> 01, +1 -> 10, +3 -> 11
    [
        (false, false),
        (false, true),
        (true, false),
        (true, true),
    ],
];

/// Quaternary ASK over {-3, -1, +1, +3}, mean symbol energy 5.
#[derive(Debug, Clone, Copy)]
pub struct Ask4 {
    mapping: Ask4Mapping,
}

impl Ask4 {
    pub fn new(mapping: Ask4Mapping) -> Self {
        Self { mapping }
    }

    fn labels(&self) -> &'static [(bool, bool); 4] {
        match self.mapping {
            Ask4Mapping::Gray => &ASK4_LABELS[0],
            Ask4Mapping::Natural => &ASK4_LABELS[1],
        }
    }
}

impl Modem for Ask4 {
    fn modulate(&self, bits: &[bool]) -> f64 {
        let pair = (bits[0], bits[1]);
        let labels = self.labels();
        // Four labels, all distinct; the position is the constellation index.
        let idx = labels.iter().position(|&l| l == pair).unwrap_or(0);
        ASK4_POINTS[idx]
    }

    fn demodulate(&self, r: f64, out: &mut Vec<bool>) {
        // Midpoint thresholds at -2, 0, +2
        let idx = if r < -2.0 {
            0
        } else if r < 0.0 {
            1
        } else if r < 2.0 {
            2
        } else {
            3
        };
        let (b0, b1) = self.labels()[idx];
        out.push(b0);
        out.push(b1);
    }

    fn demodulate_llr(&self, r: f64, sigma2: f64, out: &mut Vec<f64>) {
        // Per-point likelihoods for [-3, -1, +1, +3]
        let mut p = [0.0f64; 4];
        for (k, &a) in ASK4_POINTS.iter().enumerate() {
            let d = r - a;
            p[k] = (-d * d / (2.0 * sigma2)).exp();
        }

        // MSB splits the constellation in half for both labelings
        out.push(((p[0] + p[1]) / (p[2] + p[3])).ln());
        // LSB partition depends on the labeling
        match self.mapping {
            Ask4Mapping::Gray => out.push(((p[0] + p[3]) / (p[1] + p[2])).ln()),
            Ask4Mapping::Natural => out.push(((p[0] + p[2]) / (p[1] + p[3])).ln()),
        }
    }

    fn bits_per_symbol(&self) -> usize {
        2
    }

    fn symbol_energy(&self) -> f64 {
        5.0
    }
}

/// Build a modem from its configuration name (case-insensitive).
pub fn from_name(name: &str) -> Result<Box<dyn Modem>> {
    match name.to_ascii_lowercase().as_str() {
        "ask2" => Ok(Box::new(Ask2)),
        "ask4" | "ask4_gray" => Ok(Box::new(Ask4::new(Ask4Mapping::Gray))),
        "ask4_natural" | "ask4_binary" | "ask4_nogray" => {
            Ok(Box::new(Ask4::new(Ask4Mapping::Natural)))
        }
        _ => Err(Error::UnknownComponent {
            kind: "modem",
            name: name.to_string(),
        }),
    }
}
