//! Two-sample Kolmogorov–Smirnov test.
//!
//! The statistic is the largest gap between the two empirical CDFs. It is
//! computed on the integer lattice of both sample sizes (`lcm(n1, n2)` units),
//! so ties and identical samples give exact results. The two-sided p-value is
//! either the exact probability of a lattice path leaving the band
//! `|x/n1 - y/n2| < d`, or the limiting Kolmogorov distribution.
use crate::constants::{EXACT_KS_MAX_N, KOLMOGOROV_MAX_TERMS, KOLMOGOROV_SMALL_LAMBDA, KOLMOGOROV_TERM_EPS};
use crate::errors::DriftError;
use crate::utils::{gcd, items_to_strings, sorted_copy};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// How the p-value of the two-sample KS test is computed.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum KsMethod {
    /// Exact when the larger sample has at most `EXACT_KS_MAX_N` values, asymptotic otherwise.
    #[default]
    Auto,
    /// Exact lattice-path probability.
    Exact,
    /// Limiting Kolmogorov distribution at `d * sqrt(n1 * n2 / (n1 + n2))`.
    Asymptotic,
}

impl FromStr for KsMethod {
    type Err = DriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(KsMethod::Auto),
            "exact" => Ok(KsMethod::Exact),
            "asymptotic" | "asymp" => Ok(KsMethod::Asymptotic),
            _ => Err(DriftError::ParseString(
                s.to_string(),
                "KsMethod".to_string(),
                items_to_strings(vec!["auto", "exact", "asymptotic"]),
            )),
        }
    }
}

/// Result of a two-sample KS test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    /// Maximum absolute difference between the empirical CDFs, in `[0, 1]`.
    pub statistic: f64,
    /// Two-sided p-value, in `[0, 1]`.
    pub p_value: f64,
    /// Method actually used, never `Auto`.
    pub method: KsMethod,
}

/// Two-sample KS test on unsorted samples.
///
/// Both samples must be non-empty and finite.
pub fn ks_2samp(a: &[f64], b: &[f64], method: KsMethod) -> KsResult {
    let a = sorted_copy(a);
    let b = sorted_copy(b);
    ks_2samp_sorted(&a, &b, method)
}

/// Two-sample KS test on samples already sorted in ascending order.
pub fn ks_2samp_sorted(a: &[f64], b: &[f64], method: KsMethod) -> KsResult {
    let (n1, n2) = (a.len(), b.len());
    let g = gcd(n1 as u64, n2 as u64);
    let lcm = (n1 as u64 / g) * n2 as u64;
    let h = max_ecdf_gap(a, b);
    let statistic = h as f64 / lcm as f64;

    let method = match method {
        KsMethod::Auto if n1.max(n2) <= EXACT_KS_MAX_N => KsMethod::Exact,
        KsMethod::Auto => KsMethod::Asymptotic,
        m => m,
    };
    let p_value = match method {
        KsMethod::Exact => exact_p_value(n1, n2, h),
        _ => asymptotic_p_value(n1, n2, statistic),
    };

    KsResult {
        statistic,
        p_value,
        method,
    }
}

/// Largest ECDF gap in lattice units, i.e. `max |i * n2 - j * n1| / g`
/// over all thresholds, where `i` and `j` count values `<=` the threshold.
fn max_ecdf_gap(a: &[f64], b: &[f64]) -> u64 {
    let (n1, n2) = (a.len(), b.len());
    let g = gcd(n1 as u64, n2 as u64);
    let (step_a, step_b) = (n2 as u64 / g, n1 as u64 / g);

    let (mut i, mut j) = (0, 0);
    let mut max_gap = 0;
    while i < n1 && j < n2 {
        let x = a[i].min(b[j]);
        while i < n1 && a[i] <= x {
            i += 1;
        }
        while j < n2 && b[j] <= x {
            j += 1;
        }
        let gap = (i as u64 * step_a).abs_diff(j as u64 * step_b);
        max_gap = max_gap.max(gap);
    }
    // Once one sample is exhausted the gap only shrinks.
    max_gap
}

/// Exact two-sided p-value `P(D >= h / lcm)` under the null hypothesis.
///
/// Every interleaving of the two samples is a monotone lattice path from
/// `(0, 0)` to `(m, n)`, all equally likely. A cell `(x, y)` is outside the
/// band when `|x * n/g - y * m/g| >= h`. For each cell we carry the fraction
/// of paths reaching it that have already left the band; cells outside are 1.
/// Only the band of each column is stored.
pub fn exact_p_value(n1: usize, n2: usize, h: u64) -> f64 {
    if h == 0 {
        return 1.0;
    }
    let (m, n) = if n1 >= n2 { (n1, n2) } else { (n2, n1) };
    let g = gcd(m as u64, n as u64) as i64;
    let (m, n) = (m as i64, n as i64);
    let (mg, ng) = (m / g, n / g);
    let h = h as i64;

    // Half-open range of y strictly inside the band at column x.
    let band = |x: i64| -> (i64, i64) {
        let lo = ((x * ng - h).div_euclid(mg) + 1).max(0);
        let hi = (-(-(x * ng + h)).div_euclid(mg)).min(n + 1);
        (lo, hi)
    };

    // Column x = 0: every cell inside the band is reached without leaving it.
    let mut col = vec![0.0_f64; (n + 1) as usize];
    let (mut lo, mut hi) = band(0);

    for x in 1..=m {
        let (next_lo, next_hi) = band(x);
        if next_hi <= next_lo {
            return 1.0;
        }
        let mut below = if next_lo == 0 { 0.0 } else { 1.0 };
        for y in next_lo..next_hi {
            let left = if y >= lo && y < hi { col[y as usize] } else { 1.0 };
            below = (left * x as f64 + below * y as f64) / (x + y) as f64;
            col[y as usize] = below;
        }
        lo = next_lo;
        hi = next_hi;
    }

    col[n as usize].clamp(0.0, 1.0)
}

/// Asymptotic two-sided p-value from the limiting Kolmogorov distribution
/// at `d * sqrt(n1 * n2 / (n1 + n2))`.
///
/// This is not scipy's `asymp` p-value, which evaluates the finite-n
/// distribution `kstwo.sf(d, round(en))`. The two differ slightly for small
/// samples; `KsMethod::Auto` only takes this branch above `EXACT_KS_MAX_N`.
pub fn asymptotic_p_value(n1: usize, n2: usize, statistic: f64) -> f64 {
    let en = (n1 as f64 * n2 as f64) / (n1 + n2) as f64;
    kolmogorov_sf(en.sqrt() * statistic)
}

/// Survival function of the Kolmogorov distribution, `P(K > lambda)`.
pub fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    if lambda < KOLMOGOROV_SMALL_LAMBDA {
        // P(K <= l) = sqrt(2 pi) / l * sum_k exp(-(2k - 1)^2 pi^2 / (8 l^2))
        let w = PI * PI / (8.0 * lambda * lambda);
        let mut sum = 0.0;
        for k in 1..=KOLMOGOROV_MAX_TERMS {
            let odd = (2 * k - 1) as f64;
            let term = (-odd * odd * w).exp();
            sum += term;
            if term < KOLMOGOROV_TERM_EPS {
                break;
            }
        }
        let cdf = (2.0 * PI).sqrt() / lambda * sum;
        (1.0 - cdf).clamp(0.0, 1.0)
    } else {
        // P(K > l) = 2 * sum_k (-1)^(k - 1) exp(-2 k^2 l^2)
        let mut sum = 0.0;
        for k in 1..=KOLMOGOROV_MAX_TERMS {
            let kf = k as f64;
            let term = (-2.0 * kf * kf * lambda * lambda).exp();
            sum += if k % 2 == 1 { term } else { -term };
            if term < KOLMOGOROV_TERM_EPS {
                break;
            }
        }
        (2.0 * sum).clamp(0.0, 1.0)
    }
}
