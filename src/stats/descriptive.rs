use crate::constants::ZERO_GUARD_SHIFT;

/// Running mean and sum of squared deviations (Welford).
fn running_moments(values: &[f64]) -> (f64, f64) {
    let mut m = 0.0;
    let mut m2 = 0.0;
    for (k, &x) in values.iter().enumerate() {
        let delta = x - m;
        m += delta / (k + 1) as f64;
        m2 += delta * (x - m);
    }
    (m, m2)
}

/// Arithmetic mean. Returns NaN for an empty slice; callers validate first.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    running_moments(values).0
}

/// Population standard deviation (divisor N, not N - 1).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    (running_moments(values).1 / values.len() as f64).sqrt()
}

/// Sample standard deviation (divisor N - 1), zero for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    (running_moments(values).1 / (values.len() - 1) as f64).sqrt()
}

/// Percent change of `shift` relative to `base`.
///
/// When `base` is exactly zero the ratio is undefined and [`ZERO_GUARD_SHIFT`] is
/// returned instead, which hides any real shift away from a zero reference.
#[inline]
pub fn relative_shift_pct(shift: f64, base: f64) -> f64 {
    if base == 0.0 {
        ZERO_GUARD_SHIFT
    } else {
        shift / base * 100.0
    }
}

/// How many reference standard deviations the mean moved, zero when `ref_std` is zero.
#[inline]
pub fn z_score_shift(ref_mean: f64, curr_mean: f64, ref_std: f64) -> f64 {
    if ref_std == 0.0 {
        ZERO_GUARD_SHIFT
    } else {
        (curr_mean - ref_mean) / ref_std
    }
}
