//! Statistics
//!
//! Numerical building blocks for drift metrics: summary statistics, the
//! two-sample Kolmogorov–Smirnov test, the 1-D Wasserstein distance and
//! kernel density estimates for charts.
pub mod descriptive;
pub mod kde;
pub mod ks;
pub mod wasserstein;

pub use ks::{ks_2samp, KsMethod, KsResult};
pub use wasserstein::wasserstein_distance;
