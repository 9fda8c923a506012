use crate::constants::{KS_P_VALUE_THRESHOLD, MEAN_SHIFT_PCT_THRESHOLD};
use crate::errors::DriftError;
use crate::stats::descriptive::{mean, population_std, relative_shift_pct, z_score_shift};
use crate::stats::ks::{ks_2samp_sorted, KsMethod};
use crate::stats::wasserstein::wasserstein_distance_sorted;
use crate::utils::{sorted_copy, validate_sample};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Drift metrics of one feature between a reference and a current window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftMetrics {
    /// Name of the feature.
    pub feature: String,
    /// Mean of the reference window.
    pub ref_mean: f64,
    /// Mean of the current window.
    pub curr_mean: f64,
    /// Percent change of the mean relative to the reference mean, 0 when that mean is 0.
    pub mean_shift_pct: f64,
    /// Percent change of the std relative to the reference std, 0 when that std is 0.
    pub std_shift_pct: f64,
    /// Population std of the reference window.
    pub ref_std: f64,
    /// Population std of the current window.
    pub curr_std: f64,
    /// Mean shift in units of the reference std, 0 when that std is 0.
    pub z_score_shift: f64,
    /// Two-sample Kolmogorov–Smirnov statistic.
    pub ks_stat: f64,
    /// Two-sided p-value of the KS test.
    pub ks_p_value: f64,
    /// 1-D Wasserstein distance between the windows.
    pub wasserstein_dist: f64,
    /// Heuristic flag, see [`DriftThresholds::is_drift`].
    pub drift_detected: bool,
}

impl DriftMetrics {
    /// Whether `mean_shift_pct` was forced to zero because the reference mean is zero.
    /// In that case the percent shift says nothing about drift.
    pub fn mean_shift_is_guarded(&self) -> bool {
        self.ref_mean == 0.0
    }
}

/// Thresholds of the drift flag.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct DriftThresholds {
    /// KS p-value must be strictly below this.
    pub p_value: f64,
    /// Absolute mean shift (percent) must be strictly above this.
    pub mean_shift_pct: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        DriftThresholds {
            p_value: KS_P_VALUE_THRESHOLD,
            mean_shift_pct: MEAN_SHIFT_PCT_THRESHOLD,
        }
    }
}

impl DriftThresholds {
    /// A feature drifted when the distributions differ significantly
    /// and the mean moved by a material amount.
    pub fn is_drift(&self, ks_p_value: f64, mean_shift_pct: f64) -> bool {
        ks_p_value < self.p_value && mean_shift_pct.abs() > self.mean_shift_pct
    }
}

/// Computes [`DriftMetrics`] from two samples of one feature.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct DriftMetricsCalculator {
    pub thresholds: DriftThresholds,
    pub ks_method: KsMethod,
}

impl DriftMetricsCalculator {
    pub fn new(thresholds: DriftThresholds, ks_method: KsMethod) -> Self {
        DriftMetricsCalculator { thresholds, ks_method }
    }

    /// Calculate drift metrics for a single feature.
    ///
    /// * `reference` - Values of the feature in the reference window.
    /// * `current` - Values of the feature in the current window.
    /// * `feature` - Name of the feature.
    ///
    /// Fails with [`DriftError::InvalidInput`] if either sample is empty or
    /// contains NaN or infinite values.
    pub fn calculate(&self, reference: &[f64], current: &[f64], feature: &str) -> Result<DriftMetrics, DriftError> {
        validate_sample(reference, &format!("reference sample for {}", feature))?;
        validate_sample(current, &format!("current sample for {}", feature))?;

        let ref_mean = mean(reference);
        let curr_mean = mean(current);
        let ref_std = population_std(reference);
        let curr_std = population_std(current);

        let mean_shift_pct = relative_shift_pct(curr_mean - ref_mean, ref_mean);
        let std_shift_pct = relative_shift_pct(curr_std - ref_std, ref_std);
        let z_score_shift = z_score_shift(ref_mean, curr_mean, ref_std);
        if ref_mean == 0.0 {
            warn!(
                "Reference mean of {} is zero, reporting a mean shift of {} for a current mean of {}.",
                feature, mean_shift_pct, curr_mean
            );
        }

        let ref_sorted = sorted_copy(reference);
        let curr_sorted = sorted_copy(current);
        let ks = ks_2samp_sorted(&ref_sorted, &curr_sorted, self.ks_method);
        let wasserstein_dist = wasserstein_distance_sorted(&ref_sorted, &curr_sorted);

        let statistics = [
            ("ref_mean", ref_mean),
            ("curr_mean", curr_mean),
            ("ref_std", ref_std),
            ("curr_std", curr_std),
            ("mean_shift_pct", mean_shift_pct),
            ("std_shift_pct", std_shift_pct),
            ("z_score_shift", z_score_shift),
            ("wasserstein_dist", wasserstein_dist),
        ];
        if let Some((name, value)) = statistics.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DriftError::InvalidInput(format!(
                "{} of {} is {}, values exceed the f64 range",
                name, feature, value
            )));
        }
        debug!(
            "{}: n_ref={}, n_curr={}, ks method {:?}",
            feature,
            reference.len(),
            current.len(),
            ks.method
        );

        Ok(DriftMetrics {
            feature: feature.to_string(),
            ref_mean,
            curr_mean,
            mean_shift_pct,
            std_shift_pct,
            ref_std,
            curr_std,
            z_score_shift,
            ks_stat: ks.statistic,
            ks_p_value: ks.p_value,
            wasserstein_dist,
            drift_detected: self.thresholds.is_drift(ks.p_value, mean_shift_pct),
        })
    }
}

/// Calculate drift metrics with the default thresholds and KS method.
pub fn calculate_drift_metrics(reference: &[f64], current: &[f64], feature: &str) -> Result<DriftMetrics, DriftError> {
    DriftMetricsCalculator::default().calculate(reference, current, feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ZERO_GUARD_SHIFT;

    #[test]
    fn test_separated_windows() {
        let reference = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let current = vec![11.0, 12.0, 13.0, 14.0, 15.0];
        let m = calculate_drift_metrics(&reference, &current, "trip_distance").unwrap();
        assert_eq!(m.feature, "trip_distance");
        assert_eq!(m.ref_mean, 3.0);
        assert_eq!(m.curr_mean, 13.0);
        assert!((m.mean_shift_pct - 333.3333333333333).abs() < 1e-9);
        assert!((m.ref_std - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((m.curr_std - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(m.std_shift_pct.abs() < 1e-9);
        assert!((m.z_score_shift - 10.0 / 2.0_f64.sqrt()).abs() < 1e-9);
        assert_eq!(m.ks_stat, 1.0);
        assert!((m.ks_p_value - 0.0079).abs() < 1e-4);
        assert!((m.wasserstein_dist - 10.0).abs() < 1e-12);
        assert!(m.drift_detected);
    }

    #[test]
    fn test_identical_windows() {
        let sample = vec![4.2, 1.0, 3.3, 3.3, 9.9, 0.5];
        let m = calculate_drift_metrics(&sample, &sample, "fare_amount").unwrap();
        assert_eq!(m.mean_shift_pct, 0.0);
        assert_eq!(m.std_shift_pct, 0.0);
        assert_eq!(m.z_score_shift, 0.0);
        assert_eq!(m.ks_stat, 0.0);
        assert_eq!(m.ks_p_value, 1.0);
        assert_eq!(m.wasserstein_dist, 0.0);
        assert!(!m.drift_detected);
    }

    #[test]
    fn test_zero_reference_mean_guard() {
        let reference = vec![0.0, 0.0, 0.0, 0.0];
        for current in [vec![5.0, 6.0, 7.0], vec![-100.0], vec![0.0, 0.0]] {
            let m = calculate_drift_metrics(&reference, &current, "passenger_count").unwrap();
            assert_eq!(m.mean_shift_pct, ZERO_GUARD_SHIFT);
            assert_eq!(m.std_shift_pct, ZERO_GUARD_SHIFT);
            assert_eq!(m.z_score_shift, ZERO_GUARD_SHIFT);
            assert!(m.mean_shift_is_guarded());
            assert!(!m.drift_detected);
        }
    }

    #[test]
    fn test_swap_symmetry() {
        let a = vec![1.0, 5.0, 2.0, 8.0, 3.0, 3.0, 7.5];
        let b = vec![2.0, 9.0, 4.0, 6.0];
        let ab = calculate_drift_metrics(&a, &b, "x").unwrap();
        let ba = calculate_drift_metrics(&b, &a, "x").unwrap();
        assert_eq!(ab.ks_stat, ba.ks_stat);
        assert!((ab.ks_p_value - ba.ks_p_value).abs() < 1e-12);
        assert!((ab.wasserstein_dist - ba.wasserstein_dist).abs() < 1e-12);
        assert!(ab.wasserstein_dist > 0.0);
    }

    #[test]
    fn test_invalid_input() {
        let ok = vec![1.0, 2.0];
        assert!(matches!(
            calculate_drift_metrics(&[], &ok, "x"),
            Err(DriftError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_drift_metrics(&ok, &[], "x"),
            Err(DriftError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_drift_metrics(&ok, &[1.0, f64::NAN], "x"),
            Err(DriftError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_drift_metrics(&[f64::INFINITY], &ok, "x"),
            Err(DriftError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_values_near_f64_limit() {
        let m = calculate_drift_metrics(&[1e308, 1e308], &[1.0, 2.0], "x").unwrap();
        assert_eq!(m.ref_mean, 1e308);
        assert_eq!(m.ref_std, 0.0);
        assert!(m.mean_shift_pct.is_finite());
        assert!((m.mean_shift_pct + 100.0).abs() < 1e-9);
        assert_eq!(m.ks_stat, 1.0);

        // spread wider than f64::MAX
        let r = calculate_drift_metrics(&[-1.7e308, 1.7e308], &[1.0, 2.0], "x");
        assert!(matches!(r, Err(DriftError::InvalidInput(_))));
    }

    #[test]
    fn test_threshold_boundaries() {
        let t = DriftThresholds::default();
        // both inside
        assert!(t.is_drift(0.049, 10.01));
        assert!(t.is_drift(0.049, -10.01));
        // p-value on or past the boundary
        assert!(!t.is_drift(0.05, 10.01));
        assert!(!t.is_drift(0.051, 50.0));
        // shift on or below the boundary
        assert!(!t.is_drift(0.049, 10.0));
        assert!(!t.is_drift(0.049, -9.99));
        // both outside
        assert!(!t.is_drift(0.5, 1.0));
    }

    #[test]
    fn test_custom_thresholds() {
        let reference = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let current = vec![11.0, 12.0, 13.0, 14.0, 15.0];
        let strict = DriftThresholds {
            p_value: 0.001,
            mean_shift_pct: 10.0,
        };
        let m = DriftMetricsCalculator::new(strict, KsMethod::Exact)
            .calculate(&reference, &current, "x")
            .unwrap();
        assert!(!m.drift_detected);
    }

    #[test]
    fn test_metrics_serialize() {
        let m = calculate_drift_metrics(&[1.0, 2.0], &[1.0, 3.0], "fare_amount").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"feature\":\"fare_amount\""));
        let back: DriftMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
