//! Drift
//!
//! Per-feature drift metrics between a reference and a current window, and
//! the multi-feature run built on top of them.
pub mod analysis;
pub mod calculation;

pub use analysis::{analyze_features, AnalysisSummary, FeatureOutcome, FeatureSource};
pub use calculation::{calculate_drift_metrics, DriftMetrics, DriftMetricsCalculator, DriftThresholds};
