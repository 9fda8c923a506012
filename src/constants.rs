/// Significance level below which the KS test rejects "same distribution".
pub const KS_P_VALUE_THRESHOLD: f64 = 0.05;
/// Minimum absolute percent change of the mean for a feature to be flagged.
pub const MEAN_SHIFT_PCT_THRESHOLD: f64 = 10.0;
/// Value reported for a relative shift whose base (reference mean or std) is exactly zero.
/// This conflates "no shift" with "undefined shift".
pub const ZERO_GUARD_SHIFT: f64 = 0.0;

/// Largest sample size for which the exact KS p-value is used in `KsMethod::Auto`.
pub const EXACT_KS_MAX_N: usize = 10_000;
/// Maximum number of terms summed in the Kolmogorov series.
pub const KOLMOGOROV_MAX_TERMS: usize = 100;
/// Terms of the Kolmogorov series below this magnitude end the summation.
pub const KOLMOGOROV_TERM_EPS: f64 = 1e-16;
/// Switch point between the small-lambda (Jacobi theta) and large-lambda series.
pub const KOLMOGOROV_SMALL_LAMBDA: f64 = 1.18;

pub const DEFAULT_DATA_PATH: &str = "../yellow_tripdata_2016-01.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_DATE_COLUMN: &str = "tpep_pickup_datetime";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_FEATURES: [&str; 3] = ["trip_distance", "fare_amount", "passenger_count"];
pub const DEFAULT_SPLIT_DATE: &str = "2016-01-15";
pub const DEFAULT_MAX_ROWS: usize = 100_000;
pub const DIAGNOSE_ROWS: usize = 1_000;

/// Number of grid points for density curves.
pub const KDE_GRID_POINTS: usize = 200;
/// Grid extends this many bandwidths past the sample range.
pub const KDE_CUT: f64 = 3.0;

pub const JSON_REPORT_FILE: &str = "drift_report.json";
