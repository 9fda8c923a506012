// Modules
pub mod config;
pub mod constants;
pub mod data;
pub mod drift;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod plots;
pub mod report;
pub mod stats;
pub mod utils;
pub mod window;

// Individual classes, and functions
pub use config::{AnalysisConfig, ConfigIO, SplitStrategy};
pub use data::TripTable;
pub use drift::{calculate_drift_metrics, DriftMetrics, DriftMetricsCalculator};
pub use engine::run_analysis;
pub use errors::DriftError;
