use crate::drift::calculation::{DriftMetrics, DriftMetricsCalculator};
use crate::errors::DriftError;
use hashbrown::HashMap;
use log::{info, warn};
use rayon::prelude::*;

/// Anything that can hand out the values of a named numeric feature.
pub trait FeatureSource: Sync {
    /// Values of `name`, or `None` if the feature is not present.
    fn feature(&self, name: &str) -> Option<&[f64]>;
}

impl FeatureSource for HashMap<String, Vec<f64>> {
    fn feature(&self, name: &str) -> Option<&[f64]> {
        self.get(name).map(|v| v.as_slice())
    }
}

/// Result of analysing one feature. A failed feature does not fail the run.
#[derive(Debug)]
pub struct FeatureOutcome {
    pub feature: String,
    pub result: Result<DriftMetrics, DriftError>,
}

/// Outcomes of all requested features, in the order they were requested.
#[derive(Debug, Default)]
pub struct AnalysisSummary {
    pub outcomes: Vec<FeatureOutcome>,
}

impl AnalysisSummary {
    /// Metrics of every feature that was analysed successfully.
    pub fn metrics(&self) -> impl Iterator<Item = &DriftMetrics> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Names of the features flagged as drifted.
    pub fn drifted_features(&self) -> Vec<&str> {
        self.metrics()
            .filter(|m| m.drift_detected)
            .map(|m| m.feature.as_str())
            .collect()
    }

    /// Features that could not be analysed, with the reason.
    pub fn failures(&self) -> Vec<(&str, &DriftError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.feature.as_str(), e)))
            .collect()
    }

    /// Look up the outcome of a feature by name.
    pub fn get(&self, feature: &str) -> Option<&FeatureOutcome> {
        self.outcomes.iter().find(|o| o.feature == feature)
    }
}

/// Analyse every feature independently on a dedicated thread pool.
///
/// * `calculator` - Metrics calculator, shared read-only by all workers.
/// * `reference` - Source of the reference window values.
/// * `current` - Source of the current window values.
/// * `features` - Feature names, the order of the returned outcomes.
/// * `num_threads` - Size of the pool, all available cores when `None`.
pub fn analyze_features<R: FeatureSource, C: FeatureSource>(
    calculator: &DriftMetricsCalculator,
    reference: &R,
    current: &C,
    features: &[String],
    num_threads: Option<usize>,
) -> Result<AnalysisSummary, DriftError> {
    let num_threads = match num_threads {
        Some(n) => n,
        None => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| DriftError::InvalidParameter("num_threads".to_string(), "a buildable pool size".to_string(), e.to_string()))?;

    let outcomes: Vec<FeatureOutcome> = pool.install(|| {
        features
            .par_iter()
            .map(|feature| {
                let result = analyze_feature(calculator, reference, current, feature);
                if let Err(e) = &result {
                    warn!("Skipping drift metrics for {}: {}", feature, e);
                }
                FeatureOutcome {
                    feature: feature.clone(),
                    result,
                }
            })
            .collect()
    });

    let summary = AnalysisSummary { outcomes };
    info!(
        "Analysed {} features, {} drifted, {} failed.",
        features.len(),
        summary.drifted_features().len(),
        summary.failures().len()
    );
    Ok(summary)
}

fn analyze_feature<R: FeatureSource, C: FeatureSource>(
    calculator: &DriftMetricsCalculator,
    reference: &R,
    current: &C,
    feature: &str,
) -> Result<DriftMetrics, DriftError> {
    let ref_values = reference
        .feature(feature)
        .ok_or_else(|| DriftError::MissingColumn(feature.to_string()))?;
    let curr_values = current
        .feature(feature)
        .ok_or_else(|| DriftError::MissingColumn(feature.to_string()))?;
    calculator.calculate(ref_values, curr_values, feature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, Vec<f64>)]) -> HashMap<String, Vec<f64>> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_analyze_features_keeps_order_and_isolates_failures() {
        let reference = source(&[
            ("fare_amount", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ("trip_distance", vec![1.0, 1.5, 2.0]),
            ("passenger_count", vec![]),
        ]);
        let current = source(&[
            ("fare_amount", vec![11.0, 12.0, 13.0, 14.0, 15.0]),
            ("trip_distance", vec![1.0, 1.5, 2.0]),
            ("passenger_count", vec![1.0]),
        ]);
        let features: Vec<String> = ["trip_distance", "fare_amount", "passenger_count", "tip_amount"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let summary =
            analyze_features(&DriftMetricsCalculator::default(), &reference, &current, &features, Some(2)).unwrap();

        let names: Vec<&str> = summary.outcomes.iter().map(|o| o.feature.as_str()).collect();
        assert_eq!(names, vec!["trip_distance", "fare_amount", "passenger_count", "tip_amount"]);
        assert_eq!(summary.drifted_features(), vec!["fare_amount"]);
        assert_eq!(summary.metrics().count(), 2);

        let failures = summary.failures();
        assert_eq!(failures.len(), 2);
        assert!(matches!(failures[0], ("passenger_count", DriftError::InvalidInput(_))));
        assert!(matches!(failures[1], ("tip_amount", DriftError::MissingColumn(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let reference = source(&[
            ("a", (0..200).map(|i| (i % 13) as f64).collect()),
            ("b", (0..150).map(|i| (i as f64).sqrt()).collect()),
        ]);
        let current = source(&[
            ("a", (0..180).map(|i| (i % 11) as f64 + 0.5).collect()),
            ("b", (0..170).map(|i| (i as f64).ln_1p()).collect()),
        ]);
        let features = vec!["a".to_string(), "b".to_string()];
        let calc = DriftMetricsCalculator::default();
        let one = analyze_features(&calc, &reference, &current, &features, Some(1)).unwrap();
        let four = analyze_features(&calc, &reference, &current, &features, Some(4)).unwrap();
        for f in &features {
            let m1 = one.get(f).unwrap().result.as_ref().unwrap();
            let m4 = four.get(f).unwrap().result.as_ref().unwrap();
            assert_eq!(m1, m4);
        }
    }
}
