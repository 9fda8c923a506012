//! Plots
//!
//! SVG charts comparing the two windows of a feature: overlapping density
//! estimates, and the daily mean over time with the split point marked.
use crate::data::TripTable;
use crate::errors::DriftError;
use crate::stats::kde::{paired_density, DensityCurve};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::{info, warn};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const REFERENCE_COLOR: &str = "#1f77b4";
const CURRENT_COLOR: &str = "#d62728";
const TREND_COLOR: &str = "#800080";
const SPLIT_COLOR: &str = "#ff0000";
const TICKS: usize = 5;

/// Plot area inside a fixed-size canvas.
struct Canvas {
    width: f64,
    height: f64,
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Canvas {
    fn new(width: f64, height: f64) -> Self {
        Canvas {
            width,
            height,
            left: 80.0,
            right: width - 30.0,
            top: 50.0,
            bottom: height - 60.0,
        }
    }

    fn x(&self, v: f64, lo: f64, hi: f64) -> f64 {
        self.left + (v - lo) / span(lo, hi) * (self.right - self.left)
    }

    fn y(&self, v: f64, lo: f64, hi: f64) -> f64 {
        self.bottom - (v - lo) / span(lo, hi) * (self.bottom - self.top)
    }

    fn open(&self, title: &str, x_label: &str, y_label: &str) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <style>
    .title {{ font: bold 16px sans-serif; fill: #333; }}
    .axis {{ font: 12px sans-serif; fill: #333; }}
    .tick {{ font: 10px sans-serif; fill: #555; }}
    .legend {{ font: 12px sans-serif; fill: #333; }}
  </style>
  <rect width="{w}" height="{h}" fill="#ffffff"/>
  <text x="{cx}" y="30" text-anchor="middle" class="title">{title}</text>
  <text x="{cx}" y="{xl}" text-anchor="middle" class="axis">{x_label}</text>
  <text x="20" y="{cy}" text-anchor="middle" class="axis" transform="rotate(-90 20 {cy})">{y_label}</text>
  <rect x="{l}" y="{t}" width="{pw}" height="{ph}" fill="none" stroke="#333"/>
"##,
            w = self.width,
            h = self.height,
            cx = self.width / 2.0,
            cy = (self.top + self.bottom) / 2.0,
            xl = self.height - 15.0,
            l = self.left,
            t = self.top,
            pw = self.right - self.left,
            ph = self.bottom - self.top,
            title = escape(title),
            x_label = escape(x_label),
            y_label = escape(y_label),
        );
        svg
    }

    /// Grid lines with tick labels; `x_label_of` formats x tick values.
    fn grid<F: Fn(f64) -> String>(&self, svg: &mut String, x: (f64, f64), y: (f64, f64), opacity: f64, x_label_of: F) {
        for i in 0..TICKS {
            let fx = x.0 + (x.1 - x.0) * i as f64 / (TICKS - 1) as f64;
            let px = self.x(fx, x.0, x.1);
            let _ = writeln!(
                svg,
                r##"  <line x1="{px:.2}" y1="{t}" x2="{px:.2}" y2="{b}" stroke="#999" stroke-opacity="{opacity}"/>
  <text x="{px:.2}" y="{lb}" text-anchor="middle" class="tick">{label}</text>"##,
                t = self.top,
                b = self.bottom,
                lb = self.bottom + 16.0,
                label = escape(&x_label_of(fx)),
            );
            let fy = y.0 + (y.1 - y.0) * i as f64 / (TICKS - 1) as f64;
            let py = self.y(fy, y.0, y.1);
            let _ = writeln!(
                svg,
                r##"  <line x1="{l}" y1="{py:.2}" x2="{r}" y2="{py:.2}" stroke="#999" stroke-opacity="{opacity}"/>
  <text x="{lt}" y="{py:.2}" text-anchor="end" class="tick">{fy:.3}</text>"##,
                l = self.left,
                r = self.right,
                lt = self.left - 6.0,
            );
        }
    }

    fn legend(&self, svg: &mut String, entries: &[(&str, &str, bool)]) {
        for (i, (label, color, dashed)) in entries.iter().enumerate() {
            let y = self.top + 18.0 + 18.0 * i as f64;
            let x = self.right - 170.0;
            let dash = if *dashed { r#" stroke-dasharray="6,4""# } else { "" };
            let _ = writeln!(
                svg,
                r##"  <line x1="{x}" y1="{y}" x2="{x2}" y2="{y}" stroke="{color}" stroke-width="2"{dash}/>
  <text x="{tx}" y="{ty}" class="legend">{label}</text>"##,
                x2 = x + 24.0,
                tx = x + 30.0,
                ty = y + 4.0,
                label = escape(label),
            );
        }
    }
}

fn span(lo: f64, hi: f64) -> f64 {
    if hi > lo {
        hi - lo
    } else {
        1.0
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn points(canvas: &Canvas, xs: &[f64], ys: &[f64], x: (f64, f64), y: (f64, f64)) -> String {
    xs.iter()
        .zip(ys.iter())
        .map(|(&a, &b)| format!("{:.2},{:.2}", canvas.x(a, x.0, x.1), canvas.y(b, y.0, y.1)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// SVG with the density curves of both windows filled under a shared axis.
/// A window without a curve is left out of the chart and its legend.
pub fn render_distribution_svg(feature: &str, reference: Option<&DensityCurve>, current: Option<&DensityCurve>) -> String {
    let canvas = Canvas::new(1000.0, 600.0);
    let curves: Vec<(&DensityCurve, &str, &str)> = [
        (reference, REFERENCE_COLOR, "Reference Window"),
        (current, CURRENT_COLOR, "Current Window"),
    ]
    .into_iter()
    .filter_map(|(curve, color, label)| curve.map(|c| (c, color, label)))
    .collect();

    let grid = curves.first().map(|(c, _, _)| c.grid.as_slice()).unwrap_or(&[]);
    let x = (grid.first().copied().unwrap_or(0.0), grid.last().copied().unwrap_or(1.0));
    let y_max = curves
        .iter()
        .flat_map(|(c, _, _)| c.density.iter())
        .fold(0.0_f64, |a, &b| a.max(b));
    let y = (0.0, y_max * 1.05);

    let mut svg = canvas.open(&format!("Distribution Shift: {}", feature), feature, "Density");
    canvas.grid(&mut svg, x, y, 0.3, |v| format!("{:.2}", v));

    for (curve, color, _) in &curves {
        let line = points(&canvas, &curve.grid, &curve.density, x, y);
        let base = canvas.y(0.0, y.0, y.1);
        let _ = writeln!(
            svg,
            r##"  <polygon points="{x0:.2},{base:.2} {line} {x1:.2},{base:.2}" fill="{color}" fill-opacity="0.3" stroke="none"/>
  <polyline points="{line}" fill="none" stroke="{color}" stroke-width="1.5"/>"##,
            x0 = canvas.x(x.0, x.0, x.1),
            x1 = canvas.x(x.1, x.0, x.1),
        );
    }
    let legend: Vec<(&str, &str, bool)> = curves.iter().map(|(_, color, label)| (*label, *color, false)).collect();
    canvas.legend(&mut svg, &legend);
    svg.push_str("</svg>\n");
    svg
}

/// SVG of daily means as a line with markers, with an optional dashed split marker.
pub fn render_trend_svg(feature: &str, daily: &[(NaiveDate, f64)], split: Option<NaiveDateTime>) -> String {
    let canvas = Canvas::new(1200.0, 600.0);
    let day = |d: NaiveDate| d.num_days_from_ce() as f64;
    let xs: Vec<f64> = daily.iter().map(|(d, _)| day(*d)).collect();
    let ys: Vec<f64> = daily.iter().map(|(_, v)| *v).collect();
    let split_x = split.map(|ts| day(ts.date()) + ts.num_seconds_from_midnight() as f64 / 86_400.0);

    let mut x_lo = xs.first().copied().unwrap_or(0.0);
    let mut x_hi = xs.last().copied().unwrap_or(1.0);
    if let Some(s) = split_x {
        x_lo = x_lo.min(s);
        x_hi = x_hi.max(s);
    }
    let (y_lo, y_hi) = ys
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let pad = (y_hi - y_lo).abs().max(1e-9) * 0.1;
    let x = (x_lo, x_hi);
    let y = (y_lo - pad, y_hi + pad);

    let mut svg = canvas.open(
        &format!("Daily Mean Trend: {}", feature),
        "Date",
        &format!("Mean {}", feature),
    );
    canvas.grid(&mut svg, x, y, 1.0, |v| {
        NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
            .map(|d| d.format("%m-%d").to_string())
            .unwrap_or_default()
    });

    let line = points(&canvas, &xs, &ys, x, y);
    let _ = writeln!(
        svg,
        r##"  <polyline points="{line}" fill="none" stroke="{TREND_COLOR}" stroke-width="2"/>"##
    );
    for (&a, &b) in xs.iter().zip(ys.iter()) {
        let _ = writeln!(
            svg,
            r##"  <circle cx="{:.2}" cy="{:.2}" r="4" fill="{TREND_COLOR}"/>"##,
            canvas.x(a, x.0, x.1),
            canvas.y(b, y.0, y.1),
        );
    }

    let mut legend = vec![(feature, TREND_COLOR, false)];
    if let Some(s) = split_x {
        let px = canvas.x(s, x.0, x.1);
        let _ = writeln!(
            svg,
            r##"  <line x1="{px:.2}" y1="{t}" x2="{px:.2}" y2="{b}" stroke="{SPLIT_COLOR}" stroke-width="2" stroke-dasharray="6,4"/>"##,
            t = canvas.top,
            b = canvas.bottom,
        );
        legend.push(("Split Point", SPLIT_COLOR, true));
    }
    canvas.legend(&mut svg, &legend);
    svg.push_str("</svg>\n");
    svg
}

fn save(output_dir: &Path, file_name: &str, svg: &str) -> Result<PathBuf, DriftError> {
    fs::create_dir_all(output_dir).map_err(|e| DriftError::UnableToWrite(format!("{}: {}", output_dir.display(), e)))?;
    let path = output_dir.join(file_name);
    fs::write(&path, svg).map_err(|e| DriftError::UnableToWrite(format!("{}: {}", path.display(), e)))?;
    info!("Saved plot: {}", path.display());
    Ok(path)
}

/// Overlapping density estimates of the two windows, saved as `{feature}_dist_shift.svg`.
pub fn plot_distribution_comparison<P: AsRef<Path>>(
    reference: &[f64],
    current: &[f64],
    feature: &str,
    output_dir: P,
) -> Result<PathBuf, DriftError> {
    let (ref_curve, curr_curve) = paired_density(reference, current)?;
    for (window, curve) in [("reference", &ref_curve), ("current", &curr_curve)] {
        if curve.is_none() {
            warn!("The {} window of {} has no variance, drawing without its density.", window, feature);
        }
    }
    let svg = render_distribution_svg(feature, ref_curve.as_ref(), curr_curve.as_ref());
    save(output_dir.as_ref(), &format!("{}_dist_shift.svg", feature), &svg)
}

/// Daily mean of a feature over the whole table, saved as `{feature}_trend.svg`.
pub fn plot_daily_trend<P: AsRef<Path>>(
    table: &TripTable,
    feature: &str,
    split: Option<NaiveDateTime>,
    output_dir: P,
) -> Result<PathBuf, DriftError> {
    let daily = table
        .daily_means(feature)
        .ok_or_else(|| DriftError::MissingColumn(feature.to_string()))?;
    if daily.is_empty() {
        return Err(DriftError::InvalidInput(format!("no rows to plot for {}", feature)));
    }
    let svg = render_trend_svg(feature, &daily, split);
    save(output_dir.as_ref(), &format!("{}_trend.svg", feature), &svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;
    use tempfile::tempdir;

    fn table() -> TripTable {
        let mut timestamps = Vec::new();
        let mut fares = Vec::new();
        for day in 1..=6 {
            for hour in [8, 12, 18] {
                timestamps.push(
                    NaiveDate::from_ymd_opt(2016, 1, day)
                        .unwrap()
                        .and_hms_opt(hour, 0, 0)
                        .unwrap(),
                );
                fares.push(day as f64 + hour as f64 / 10.0);
            }
        }
        let mut columns = HashMap::new();
        columns.insert("fare_amount".to_string(), fares);
        TripTable::new(timestamps, columns).unwrap()
    }

    #[test]
    fn test_plot_distribution_comparison() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("output");
        let reference: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        let current: Vec<f64> = (0..40).map(|i| (i % 8) as f64 + 3.0).collect();
        let path = plot_distribution_comparison(&reference, &current, "fare_amount", &out).unwrap();
        assert_eq!(path, out.join("fare_amount_dist_shift.svg"));
        let svg = fs::read_to_string(path).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("Distribution Shift: fare_amount"));
        assert!(svg.contains("Reference Window"));
        assert!(svg.contains("Current Window"));
        assert_eq!(svg.matches("<polygon").count(), 2);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_plot_distribution_with_constant_window() {
        let dir = tempdir().unwrap();
        let current: Vec<f64> = (0..30).map(|i| 1.0 + (i % 4) as f64).collect();
        let path = plot_distribution_comparison(&[1.0; 20], &current, "passenger_count", dir.path()).unwrap();
        let svg = fs::read_to_string(path).unwrap();
        assert_eq!(svg.matches("<polygon").count(), 1);
        assert!(svg.contains(CURRENT_COLOR));
        assert!(!svg.contains("Reference Window"));
        assert!(svg.contains("Current Window"));

        let r = plot_distribution_comparison(&[1.0, 1.0], &[2.0, 2.0], "x", dir.path());
        assert!(matches!(r, Err(DriftError::InvalidInput(_))));
    }

    #[test]
    fn test_plot_daily_trend() {
        let dir = tempdir().unwrap();
        let table = table();
        let split = NaiveDate::from_ymd_opt(2016, 1, 4).unwrap().and_hms_opt(0, 0, 0);
        let path = plot_daily_trend(&table, "fare_amount", split, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("fare_amount_trend.svg"));
        let svg = fs::read_to_string(path).unwrap();
        assert!(svg.contains("Daily Mean Trend: fare_amount"));
        assert_eq!(svg.matches("<circle").count(), 6);
        assert!(svg.contains("Split Point"));
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_plot_daily_trend_without_split() {
        let daily = table().daily_means("fare_amount").unwrap();
        assert_eq!(daily.len(), 6);
        assert_eq!(daily[0].0.day(), 1);
        let svg = render_trend_svg("fare_amount", &daily, None);
        assert!(!svg.contains("Split Point"));
    }

    #[test]
    fn test_plot_daily_trend_missing_feature() {
        let dir = tempdir().unwrap();
        let r = plot_daily_trend(&table(), "tip_amount", None, dir.path());
        assert!(matches!(r, Err(DriftError::MissingColumn(_))));
        let r = plot_daily_trend(&TripTable::default(), "fare_amount", None, dir.path());
        assert!(r.is_err());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & c>\""), "a&lt;b &amp; c&gt;&quot;");
    }
}
