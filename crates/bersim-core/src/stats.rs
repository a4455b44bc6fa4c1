//! Statistics Kernel — binomial confidence intervals and reference curves
//!
//! Provides the Wilson score interval used by the adaptive stopping policy,
//! the inverse standard normal quantile it needs, and closed-form AWGN
//! error-rate curves for validating measured results. The Wilson interval is
//! preferred over the normal-approximation interval because it stays well
//! behaved at the small error counts typical of low-BER measurement.
//!
//! ## Example
//!
//! ```rust
//! use bersim_core::stats::{inv_norm_cdf, wilson_interval};
//!
//! let z = inv_norm_cdf(0.975); // two-sided 95%
//! let (lo, hi, _half) = wilson_interval(10, 10_000, z);
//! assert!(lo < 0.001 && 0.001 < hi);
//! ```

/// Inverse standard normal CDF via the Acklam rational approximation.
///
/// Absolute error is below 1.2e-9 over the open interval. Inputs outside
/// `(0, 1)` return NaN; callers treat a non-positive quantile as "confidence
/// interval disabled".
pub fn inv_norm_cdf(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }

    const A: [f64; 6] = [
        -39.69683028665376,
        220.9460984245205,
        -275.9285104469687,
        138.3577518672690,
        -30.66479806614716,
        2.506628277459239,
    ];
    const B: [f64; 5] = [
        -54.47609879822406,
        161.5858368580409,
        -155.6989798598866,
        66.80131188771972,
        -13.28068155288572,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -0.3223964580411365,
        -2.400758277161838,
        -2.549732539343734,
        4.374664141464968,
        2.938163982698783,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        0.3224671290700398,
        2.445134137142996,
        3.754408661907416,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p > P_HIGH {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    }
}

/// Wilson score interval for a binomial proportion `errs / bits`.
///
/// Returns `(lo, hi, half)` where `half` is the half-width used by the
/// relative/absolute convergence targets. The degenerate zero-sample case
/// returns the uninformative `(0, 1, 0.5)`.
pub fn wilson_interval(errs: u64, bits: u64, z: f64) -> (f64, f64, f64) {
    if bits == 0 {
        return (0.0, 1.0, 0.5);
    }
    let n = bits as f64;
    let p = errs as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    ((center - half).max(0.0), (center + half).min(1.0), half)
}

/// Complementary error function, Abramowitz & Stegun approximation 7.1.26.
pub fn erfc(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.3275911 * x.abs());
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let result = poly * (-x * x).exp();
    if x >= 0.0 {
        result
    } else {
        2.0 - result
    }
}

/// Gaussian tail probability Q(x) = P(N(0,1) > x).
pub fn q_func(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// Closed-form 2-ASK BER over AWGN: Q(sqrt(2 Eb/N0)).
pub fn ask2_awgn_ber(ebn0_lin: f64) -> f64 {
    q_func((2.0 * ebn0_lin).sqrt())
}

/// Closed-form Gray-mapped 4-ASK BER over AWGN (adjacent-error term).
///
/// Symbol spacing gives the argument sqrt(0.8 Eb/N0); non-adjacent error
/// terms are negligible at the SNRs where this curve is consulted.
pub fn ask4_gray_awgn_ber(ebn0_lin: f64) -> f64 {
    0.75 * q_func((0.8 * ebn0_lin).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Binomial, Distribution};

    #[test]
    fn test_quantile_known_values() {
        assert!(inv_norm_cdf(0.5).abs() < 1e-9);
        assert!((inv_norm_cdf(0.975) - 1.959964).abs() < 1e-5);
        assert!((inv_norm_cdf(0.025) + 1.959964).abs() < 1e-5);
        assert!((inv_norm_cdf(0.995) - 2.575829).abs() < 1e-5);
        // Tail region (p < 0.02425) exercises the low branch
        assert!((inv_norm_cdf(0.001) + 3.090232).abs() < 1e-5);
    }

    #[test]
    fn test_quantile_domain() {
        assert!(inv_norm_cdf(0.0).is_nan());
        assert!(inv_norm_cdf(1.0).is_nan());
        assert!(inv_norm_cdf(-0.3).is_nan());
        assert!(inv_norm_cdf(1.7).is_nan());
    }

    #[test]
    fn test_wilson_zero_samples() {
        assert_eq!(wilson_interval(0, 0, 1.96), (0.0, 1.0, 0.5));
    }

    #[test]
    fn test_wilson_brackets_estimate() {
        let z = inv_norm_cdf(0.975);
        let (lo, hi, half) = wilson_interval(100, 10_000, z);
        let p = 0.01;
        assert!(lo < p && p < hi);
        assert!(half > 0.0);
        assert!(lo >= 0.0 && hi <= 1.0);
        // Interval shrinks with more samples
        let (_, _, half_big) = wilson_interval(1_000, 100_000, z);
        assert!(half_big < half);
    }

    #[test]
    fn test_wilson_clamps_to_unit_interval() {
        let z = inv_norm_cdf(0.975);
        let (lo, _, _) = wilson_interval(0, 100, z);
        let (_, hi, _) = wilson_interval(100, 100, z);
        assert!(lo >= 0.0 && lo < 1e-12);
        assert!(hi <= 1.0 && hi > 1.0 - 1e-12);
    }

    /// Coverage of the 95% interval at n = 1e4, p = 1e-3 over 1e4 synthetic
    /// trials stays in the 93%..97% band.
    #[test]
    fn test_wilson_coverage() {
        let z = inv_norm_cdf(0.975);
        let p_true = 1e-3;
        let n = 10_000u64;
        let trials = 10_000;
        let binom = Binomial::new(n, p_true).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let mut covered = 0;
        for _ in 0..trials {
            let k = binom.sample(&mut rng);
            let (lo, hi, _) = wilson_interval(k, n, z);
            if lo <= p_true && p_true <= hi {
                covered += 1;
            }
        }
        let coverage = covered as f64 / trials as f64;
        assert!(
            (0.93..=0.97).contains(&coverage),
            "coverage {} outside expected band",
            coverage
        );
    }

    #[test]
    fn test_erfc() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-6);
        assert!(erfc(5.0) < 1e-10);
        assert!((erfc(-5.0) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_reference_curves() {
        // 2-ASK at 0 dB is the textbook 0.0786
        assert!((ask2_awgn_ber(1.0) - 0.0786).abs() < 1e-3);
        // Both curves decrease with SNR
        assert!(ask2_awgn_ber(10.0) < ask2_awgn_ber(1.0));
        assert!(ask4_gray_awgn_ber(10.0) < ask4_gray_awgn_ber(1.0));
        // 4-ASK needs more energy per bit than 2-ASK
        assert!(ask4_gray_awgn_ber(4.0) > ask2_awgn_ber(4.0));
    }
}
