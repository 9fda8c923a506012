//! Engine
//!
//! End-to-end run over one data file: resolve the path, load the needed
//! columns, clip outliers, split into windows and analyse every feature.
use crate::config::AnalysisConfig;
use crate::data::{resolve_data_path, TripTable};
use crate::drift::{analyze_features, AnalysisSummary};
use crate::errors::DriftError;
use crate::plots::{plot_daily_trend, plot_distribution_comparison};
use crate::window::{split, Windows};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct DriftRun {
    pub data_path: PathBuf,
    /// Clipped, time-ordered table both windows were cut from.
    pub table: TripTable,
    pub windows: Windows,
    pub summary: AnalysisSummary,
}

/// Columns to read: the features, then any clip column not already requested.
pub fn required_columns(config: &AnalysisConfig) -> Vec<String> {
    let mut columns = config.features.clone();
    for rule in &config.clip_rules {
        if !columns.contains(&rule.column) {
            columns.push(rule.column.clone());
        }
    }
    columns
}

/// Resolve the data path, read the table and apply the clip rules.
pub fn load_table(config: &AnalysisConfig) -> Result<(PathBuf, TripTable), DriftError> {
    let path = resolve_data_path(&config.data_path, &config.fallback_paths)?;
    info!("Loading dataset from {}.", path.display());
    let table = TripTable::from_csv(
        &path,
        &config.date_column,
        &config.date_format,
        &required_columns(config),
        config.max_rows,
    )?;
    info!("Loaded {} rows.", table.len());
    let clipped = table.apply_clip_rules(&config.clip_rules)?;
    Ok((path, clipped.sort_by_time()))
}

/// Split an already loaded table and analyse it.
pub fn analyze_table(config: &AnalysisConfig, table: TripTable) -> Result<(TripTable, Windows, AnalysisSummary), DriftError> {
    let windows = split(&table, &config.split);
    info!(
        "Reference window: {} samples, current window: {} samples.",
        windows.reference.len(),
        windows.current.len()
    );
    if windows.reference.is_empty() {
        return Err(DriftError::EmptyWindow("reference".to_string()));
    }
    if windows.current.is_empty() {
        return Err(DriftError::EmptyWindow("current".to_string()));
    }
    let summary = analyze_features(
        &config.calculator(),
        &windows.reference,
        &windows.current,
        &config.features,
        config.num_threads,
    )?;
    Ok((table, windows, summary))
}

/// Validate the configuration, then load and analyse the data it points to.
pub fn run_analysis(config: &AnalysisConfig) -> Result<DriftRun, DriftError> {
    config.validate()?;
    let (data_path, table) = load_table(config)?;
    let (table, windows, summary) = analyze_table(config, table)?;
    Ok(DriftRun {
        data_path,
        table,
        windows,
        summary,
    })
}

impl DriftRun {
    /// Render both charts of every successfully analysed feature.
    ///
    /// A failed chart is logged and returned; the others are still written.
    pub fn write_plots<P: AsRef<Path>>(&self, output_dir: P) -> Vec<(String, Result<PathBuf, DriftError>)> {
        let output_dir = output_dir.as_ref();
        let mut results = Vec::new();
        for metrics in self.summary.metrics() {
            let feature = metrics.feature.as_str();
            let (reference, current) = match (
                self.windows.reference.column(feature),
                self.windows.current.column(feature),
            ) {
                (Some(r), Some(c)) => (r, c),
                _ => continue,
            };
            let dist = plot_distribution_comparison(reference, current, feature, output_dir);
            let trend = plot_daily_trend(&self.table, feature, self.windows.boundary, output_dir);
            for result in [dist, trend] {
                if let Err(e) = &result {
                    warn!("Plotting failed for {}: {}", feature, e);
                }
                results.push((feature.to_string(), result));
            }
        }
        results
    }
}
