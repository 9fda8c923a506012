//! Analysis Configuration
//!
//! Defines the configuration passed to ingestion, window splitting, the
//! metrics calculator and the report collaborators, plus JSON load/save.
use crate::constants::{
    DEFAULT_DATA_PATH, DEFAULT_DATE_COLUMN, DEFAULT_DATE_FORMAT, DEFAULT_FEATURES, DEFAULT_MAX_ROWS,
    DEFAULT_OUTPUT_DIR, DEFAULT_SPLIT_DATE,
};
use crate::drift::{DriftMetricsCalculator, DriftThresholds};
use crate::errors::DriftError;
use crate::stats::KsMethod;
use crate::utils::validate_positive_parameter;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Format of split dates on the command line and in configuration files.
pub const SPLIT_DATE_FORMAT: &str = "%Y-%m-%d";

/// How rows are partitioned into the reference and current windows.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub enum SplitStrategy {
    /// Reference is every row strictly before midnight of the date.
    Date(NaiveDate),
    /// Reference is the first half of the time-ordered rows.
    Half,
}

/// Rows with `column >= upper_bound` are dropped before the split.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ClipRule {
    pub column: String,
    pub upper_bound: f64,
}

impl ClipRule {
    pub fn new(column: &str, upper_bound: f64) -> Self {
        ClipRule {
            column: column.to_string(),
            upper_bound,
        }
    }
}

/// Parse a `YYYY-MM-DD` split date.
pub fn parse_split_date(s: &str) -> Result<NaiveDate, DriftError> {
    NaiveDate::parse_from_str(s, SPLIT_DATE_FORMAT)
        .map_err(|_| DriftError::ParseDate(s.to_string(), SPLIT_DATE_FORMAT.to_string()))
}

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}
fn default_date_column() -> String {
    DEFAULT_DATE_COLUMN.to_string()
}
fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}
fn default_features() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect()
}
fn default_max_rows() -> Option<usize> {
    Some(DEFAULT_MAX_ROWS)
}
fn default_clip_rules() -> Vec<ClipRule> {
    vec![ClipRule::new("fare_amount", 200.0), ClipRule::new("trip_distance", 100.0)]
}
fn default_split() -> SplitStrategy {
    match parse_split_date(DEFAULT_SPLIT_DATE) {
        Ok(date) => SplitStrategy::Date(date),
        Err(_) => SplitStrategy::Half,
    }
}
fn default_plots() -> bool {
    true
}

/// Configuration of one drift analysis run.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// CSV file to analyse.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Tried in order when `data_path` does not exist.
    #[serde(default)]
    pub fallback_paths: Vec<PathBuf>,
    /// Directory receiving charts and the JSON report, created if absent.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Column holding the trip timestamp.
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// `chrono` format of the timestamp column.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Numeric features to compare.
    #[serde(default = "default_features")]
    pub features: Vec<String>,
    /// Read at most this many records, all when `None`.
    #[serde(default = "default_max_rows")]
    pub max_rows: Option<usize>,
    /// Outlier clipping applied before the split.
    #[serde(default = "default_clip_rules")]
    pub clip_rules: Vec<ClipRule>,
    /// Window split.
    #[serde(default = "default_split")]
    pub split: SplitStrategy,
    /// Drift flag thresholds.
    #[serde(default)]
    pub thresholds: DriftThresholds,
    /// KS p-value method.
    #[serde(default)]
    pub ks_method: KsMethod,
    /// Number of threads for the per-feature analysis.
    #[serde(default)]
    pub num_threads: Option<usize>,
    /// Whether to render charts.
    #[serde(default = "default_plots")]
    pub plots: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            data_path: default_data_path(),
            fallback_paths: Vec::new(),
            output_dir: default_output_dir(),
            date_column: default_date_column(),
            date_format: default_date_format(),
            features: default_features(),
            max_rows: default_max_rows(),
            clip_rules: default_clip_rules(),
            split: default_split(),
            thresholds: DriftThresholds::default(),
            ks_method: KsMethod::default(),
            num_threads: None,
            plots: true,
        }
    }
}

impl AnalysisConfig {
    // Set methods for parameters

    /// Set the data path.
    pub fn set_data_path<P: Into<PathBuf>>(mut self, data_path: P) -> Self {
        self.data_path = data_path.into();
        self
    }

    /// Set the fallback paths tried when the data path does not exist.
    pub fn set_fallback_paths(mut self, fallback_paths: Vec<PathBuf>) -> Self {
        self.fallback_paths = fallback_paths;
        self
    }

    /// Set the output directory.
    pub fn set_output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Set the timestamp column and its format.
    pub fn set_date_column(mut self, date_column: &str, date_format: &str) -> Self {
        self.date_column = date_column.to_string();
        self.date_format = date_format.to_string();
        self
    }

    /// Set the features to compare.
    pub fn set_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    /// Set the maximum number of records to read.
    pub fn set_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Set the outlier clipping rules.
    pub fn set_clip_rules(mut self, clip_rules: Vec<ClipRule>) -> Self {
        self.clip_rules = clip_rules;
        self
    }

    /// Set the window split strategy.
    pub fn set_split(mut self, split: SplitStrategy) -> Self {
        self.split = split;
        self
    }

    /// Set the drift flag thresholds.
    pub fn set_thresholds(mut self, thresholds: DriftThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the KS p-value method.
    pub fn set_ks_method(mut self, ks_method: KsMethod) -> Self {
        self.ks_method = ks_method;
        self
    }

    /// Set the number of threads.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Enable or disable charts.
    pub fn set_plots(mut self, plots: bool) -> Self {
        self.plots = plots;
        self
    }

    /// Calculator configured with this run's thresholds and KS method.
    pub fn calculator(&self) -> DriftMetricsCalculator {
        DriftMetricsCalculator::new(self.thresholds, self.ks_method)
    }

    /// Check parameter ranges before any data is read.
    pub fn validate(&self) -> Result<(), DriftError> {
        if self.features.is_empty() {
            return Err(DriftError::InvalidParameter(
                "features".to_string(),
                "at least one feature".to_string(),
                "none".to_string(),
            ));
        }
        if let Some(n) = self.max_rows {
            validate_positive_parameter(n, "max_rows")?;
        }
        if let Some(n) = self.num_threads {
            validate_positive_parameter(n, "num_threads")?;
        }
        let p = self.thresholds.p_value;
        if p.is_nan() || p <= 0.0 || p > 1.0 {
            return Err(DriftError::InvalidParameter(
                "thresholds.p_value".to_string(),
                "a value in (0, 1]".to_string(),
                p.to_string(),
            ));
        }
        let s = self.thresholds.mean_shift_pct;
        if s.is_nan() || s < 0.0 {
            return Err(DriftError::InvalidParameter(
                "thresholds.mean_shift_pct".to_string(),
                "a non-negative value".to_string(),
                s.to_string(),
            ));
        }
        Ok(())
    }
}

/// IO
pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Save a configuration as a json object to a file.
    ///
    /// * `path` - Path to save the configuration.
    fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), DriftError> {
        fs::write(path, self.json_dump()?).map_err(|e| DriftError::UnableToWrite(e.to_string()))
    }

    /// Dump a configuration as a json object.
    fn json_dump(&self) -> Result<String, DriftError> {
        serde_json::to_string_pretty(self).map_err(|e| DriftError::UnableToWrite(e.to_string()))
    }

    /// Load a configuration from a json string.
    ///
    /// * `json_str` - String object, which can be deserialized from json.
    fn from_json(json_str: &str) -> Result<Self, DriftError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| DriftError::UnableToRead(e.to_string()))
    }

    /// Load a configuration from a path to a json file.
    ///
    /// * `path` - Path to load the configuration from.
    fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, DriftError> {
        let json_str = fs::read_to_string(path).map_err(|e| DriftError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for AnalysisConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_analysis_config_default() {
        let config = AnalysisConfig::default();
        assert_eq!(config.date_column, "tpep_pickup_datetime");
        assert_eq!(config.features, vec!["trip_distance", "fare_amount", "passenger_count"]);
        assert_eq!(config.max_rows, Some(100_000));
        assert_eq!(
            config.split,
            SplitStrategy::Date(NaiveDate::from_ymd_opt(2016, 1, 15).unwrap())
        );
        assert_eq!(config.thresholds.p_value, 0.05);
        assert_eq!(config.thresholds.mean_shift_pct, 10.0);
        assert_eq!(config.clip_rules.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_io_json() {
        let config = AnalysisConfig::default()
            .set_split(SplitStrategy::Half)
            .set_ks_method(KsMethod::Asymptotic)
            .set_num_threads(Some(3));
        let json = config.json_dump().unwrap();
        let config2 = AnalysisConfig::from_json(&json).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_config_io_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("signaldrift.json");
        let config = AnalysisConfig::default().set_output_dir(dir.path().join("out"));
        config.save_config(&file_path).unwrap();
        let config2 = AnalysisConfig::load_config(&file_path).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"features": ["fare_amount"], "split": {"Date": "2016-01-20"}, "max_rows": null}"#;
        let config = AnalysisConfig::from_json(json).unwrap();
        assert_eq!(config.features, vec!["fare_amount"]);
        assert_eq!(config.max_rows, None);
        assert_eq!(
            config.split,
            SplitStrategy::Date(NaiveDate::from_ymd_opt(2016, 1, 20).unwrap())
        );
        assert_eq!(config.date_column, "tpep_pickup_datetime");
        assert!(config.plots);
    }

    #[test]
    fn test_validate() {
        assert!(AnalysisConfig::default().set_features(vec![]).validate().is_err());
        assert!(AnalysisConfig::default().set_max_rows(Some(0)).validate().is_err());
        assert!(AnalysisConfig::default().set_num_threads(Some(0)).validate().is_err());
        let bad = DriftThresholds {
            p_value: 0.0,
            mean_shift_pct: 10.0,
        };
        assert!(AnalysisConfig::default().set_thresholds(bad).validate().is_err());
    }

    #[test]
    fn test_parse_split_date() {
        assert_eq!(
            parse_split_date("2016-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2016, 1, 15).unwrap()
        );
        assert!(matches!(parse_split_date("15/01/2016"), Err(DriftError::ParseDate(_, _))));
    }
}
