//! Ratio estimator for proportions over a sample of locations.
//!
//! Each sampled location contributes a pair `(a, m)`: `a` is the numerator (the
//! votes of interest) and `m` the denominator (for example the registered voters).

use crate::config::*;
use crate::dataframe::{Row, Table};

/// The numerator and denominator observed at one location.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct RatioSample {
    pub a: f64,
    pub m: f64,
}

/// Extracts the (numerator, denominator) pairs of the given rows.
///
/// Each side is the sum of its fields. Missing values count as zero.
pub fn ratio_samples(
    table: &Table,
    rows: &[&Row],
    numerator: &[String],
    denominator: &[String],
) -> Vec<RatioSample> {
    let num_idxs = table.column_indices(numerator);
    let den_idxs = table.column_indices(denominator);
    rows.iter()
        .map(|r| RatioSample {
            a: num_idxs.iter().filter_map(|idx| r.values[*idx]).sum(),
            m: den_idxs.iter().filter_map(|idx| r.values[*idx]).sum(),
        })
        .collect()
}

/// p = sum(a) / (mbar * k)
pub fn point_estimate(samples: &[RatioSample]) -> f64 {
    let k = samples.len() as f64;
    let sum_m: f64 = samples.iter().map(|s| s.m).sum();
    let sum_a: f64 = samples.iter().map(|s| s.a).sum();
    let mbar = sum_m / k;
    sum_a / (mbar * k)
}

/// The variance of the ratio estimator, with finite population correction.
///
/// It is NaN for a single sample.
pub fn variance(samples: &[RatioSample], big_n: Option<u64>) -> f64 {
    let k = samples.len();
    if k == 1 {
        return f64::NAN;
    }
    let kf = k as f64;
    let p = point_estimate(samples);
    let sum_m: f64 = samples.iter().map(|s| s.m).sum();
    let mbar = sum_m / kf;
    let f = match big_n {
        Some(n) => sum_m / n as f64,
        None => 0.0,
    };
    let sigma_asquared: f64 = samples.iter().map(|s| s.a * s.a).sum();
    let sigma_msquared: f64 = samples.iter().map(|s| s.m * s.m).sum();
    let sigma_am: f64 = samples.iter().map(|s| s.a * s.m).sum();

    ((1.0 - f) / (kf * mbar * mbar))
        * ((sigma_asquared - (2.0 * p * sigma_am) + (p * p * sigma_msquared)) / (kf - 1.0))
}

/// The margin of error, in percentage points, rounded to 3 decimals.
///
/// Undefined values (too few samples, empty denominators) are reported as 0.
pub fn margin_of_error(samples: &[RatioSample], big_n: Option<u64>, confidence: Confidence) -> f64 {
    let moe = round3(variance(samples, big_n).abs().sqrt() * confidence.z() * 100.0);
    if moe.is_finite() {
        moe
    } else {
        0.0
    }
}

pub fn margins_of_error(samples: &[RatioSample], big_n: Option<u64>) -> MarginsOfError {
    MarginsOfError {
        moe_95: margin_of_error(samples, big_n, Confidence::P95),
        moe_99: margin_of_error(samples, big_n, Confidence::P99),
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(pairs: &[(f64, f64)]) -> Vec<RatioSample> {
        pairs.iter().map(|(a, m)| RatioSample { a: *a, m: *m }).collect()
    }

    #[test]
    fn point_estimate_is_the_ratio_of_sums() {
        let s = samples(&[(60.0, 100.0), (55.0, 100.0), (10.0, 50.0)]);
        assert!((point_estimate(&s) - 125.0 / 250.0).abs() < 1e-12);
    }

    #[test]
    fn single_stratum() {
        let s = samples(&[(60.0, 100.0)]);
        assert!(variance(&s, None).is_nan());
        assert_eq!(margin_of_error(&s, None, Confidence::P95), 0.0);
        assert_eq!(margin_of_error(&s, Some(1000), Confidence::P99), 0.0);
    }

    #[test]
    fn no_samples() {
        assert_eq!(margin_of_error(&[], None, Confidence::P95), 0.0);
    }

    #[test]
    fn two_strata() {
        // p = 0.5, mbar = 100, residuals: 10, -10
        let s = samples(&[(60.0, 100.0), (40.0, 100.0)]);
        let v = variance(&s, None);
        assert!((v - 0.01).abs() < 1e-12);
        assert_eq!(margin_of_error(&s, None, Confidence::P95), 19.6);
        assert_eq!(margin_of_error(&s, None, Confidence::P99), 25.8);
    }

    #[test]
    fn finite_population_correction() {
        let s = samples(&[(60.0, 100.0), (40.0, 100.0)]);
        // f = 200 / 800
        let v = variance(&s, Some(800));
        assert!((v - 0.0075).abs() < 1e-12);
        // the whole population is observed
        let v_all = variance(&s, Some(200));
        assert!(v_all.abs() < 1e-12);
        assert_eq!(margin_of_error(&s, Some(200), Confidence::P95), 0.0);
    }

    #[test]
    fn zero_denominator_is_clamped() {
        let s = samples(&[(0.0, 0.0), (0.0, 0.0)]);
        assert_eq!(margin_of_error(&s, None, Confidence::P95), 0.0);
    }
}
