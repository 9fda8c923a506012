//! Report
//!
//! Fixed-format text rendering of [`DriftMetrics`] and the JSON report file.
use crate::constants::JSON_REPORT_FILE;
use crate::drift::DriftMetrics;
use crate::errors::DriftError;
use std::fs;
use std::path::{Path, PathBuf};

pub const DRIFT_FLAG_LINE: &str = "🚨 FLAG: SIGNIFICANT DRIFT DETECTED";
pub const STABLE_LINE: &str = "✅ Status: Stable";

/// Scientific notation with `precision` mantissa decimals and a signed,
/// at least two-digit exponent, e.g. `7.9365e-03`.
pub fn format_scientific(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let s = format!("{:.*e}", precision, value);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => s,
    }
}

/// Render the text report of one feature, ending with a blank line.
pub fn render_report(m: &DriftMetrics) -> String {
    let status = if m.drift_detected { DRIFT_FLAG_LINE } else { STABLE_LINE };
    format!(
        "--- Drift Report: {} ---\n\
         Means: {:.2} -> {:.2} ({:+.2}%)\n\
         Stds:  {:.2} -> {:.2}\n\
         Z-Score Shift: {:.2}\n\
         KS Test Statistic: {:.4} (p={})\n\
         Wasserstein Dist: {:.4}\n\
         {}\n\n",
        m.feature,
        m.ref_mean,
        m.curr_mean,
        m.mean_shift_pct,
        m.ref_std,
        m.curr_std,
        m.z_score_shift,
        m.ks_stat,
        format_scientific(m.ks_p_value, 4),
        m.wasserstein_dist,
        status,
    )
}

/// Print the text report of one feature to stdout.
pub fn print_metrics_report(m: &DriftMetrics) {
    println!("{}", render_report(m));
}

/// Write all metrics to `drift_report.json` in `output_dir`, creating it if absent.
pub fn write_json_report<P: AsRef<Path>>(output_dir: P, metrics: &[&DriftMetrics]) -> Result<PathBuf, DriftError> {
    let dir = output_dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| DriftError::UnableToWrite(format!("{}: {}", dir.display(), e)))?;
    let path = dir.join(JSON_REPORT_FILE);
    let json = serde_json::to_string_pretty(metrics).map_err(|e| DriftError::UnableToWrite(e.to_string()))?;
    fs::write(&path, json).map_err(|e| DriftError::UnableToWrite(format!("{}: {}", path.display(), e)))?;
    Ok(path)
}
