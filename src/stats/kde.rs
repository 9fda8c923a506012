use crate::constants::{KDE_CUT, KDE_GRID_POINTS};
use crate::errors::DriftError;
use crate::stats::descriptive::sample_std;
use crate::utils::validate_sample;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Density curve evaluated on an evenly spaced grid.
#[derive(Debug, Clone)]
pub struct DensityCurve {
    pub grid: Vec<f64>,
    pub density: Vec<f64>,
    pub bandwidth: f64,
}

/// Scott's rule bandwidth, `n^(-1/5) * std` with the N - 1 std.
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    (values.len() as f64).powf(-0.2) * sample_std(values)
}

/// Gaussian kernel density estimate evaluated at each point of `grid`.
pub fn gaussian_kde(values: &[f64], bandwidth: f64, grid: &[f64]) -> Vec<f64> {
    let norm = 1.0 / (values.len() as f64 * bandwidth * (2.0 * PI).sqrt());
    grid.par_iter()
        .map(|&x| {
            let s: f64 = values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            s * norm
        })
        .collect()
}

/// Evenly spaced grid covering `[lo, hi]` with `points` values.
pub fn linspace(lo: f64, hi: f64, points: usize) -> Vec<f64> {
    if points < 2 {
        return vec![lo];
    }
    let step = (hi - lo) / (points - 1) as f64;
    (0..points).map(|i| lo + step * i as f64).collect()
}

/// Density curves for two samples on a shared grid.
///
/// The grid spans both samples, extended by `KDE_CUT` bandwidths on each side.
/// A sample without spread has a zero bandwidth and gets no curve; it fails
/// only when neither sample can be estimated.
pub fn paired_density(
    reference: &[f64],
    current: &[f64],
) -> Result<(Option<DensityCurve>, Option<DensityCurve>), DriftError> {
    validate_sample(reference, "reference sample")?;
    validate_sample(current, "current sample")?;
    let bw_ref = scott_bandwidth(reference);
    let bw_curr = scott_bandwidth(current);
    if bw_ref <= 0.0 && bw_curr <= 0.0 {
        return Err(DriftError::InvalidInput(
            "cannot estimate a density when neither sample has variance".to_string(),
        ));
    }

    let (min, max) = reference
        .iter()
        .chain(current.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let pad = KDE_CUT * bw_ref.max(bw_curr);
    let grid = linspace(min - pad, max + pad, KDE_GRID_POINTS);

    let curve = |values: &[f64], bandwidth: f64| {
        (bandwidth > 0.0).then(|| DensityCurve {
            density: gaussian_kde(values, bandwidth, &grid),
            grid: grid.clone(),
            bandwidth,
        })
    };
    Ok((curve(reference, bw_ref), curve(current, bw_curr)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
    }

    #[test]
    fn test_single_point_kernel_peak() {
        let d = gaussian_kde(&[0.0], 1.0, &[0.0]);
        assert!((d[0] - 1.0 / (2.0 * PI).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let values: Vec<f64> = (0..100).map(|i| (i % 17) as f64 * 0.7).collect();
        let (curve, _) = paired_density(&values, &values).unwrap();
        let curve = curve.unwrap();
        let step = curve.grid[1] - curve.grid[0];
        let area: f64 = curve.density.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_constant_sample_has_no_curve() {
        let (reference, current) = paired_density(&[1.0, 1.0, 1.0], &[1.0, 2.0]).unwrap();
        assert!(reference.is_none());
        let current = current.unwrap();
        assert_eq!(current.grid.len(), KDE_GRID_POINTS);
        assert!(current.grid[0] < 1.0 && *current.grid.last().unwrap() > 2.0);

        let r = paired_density(&[1.0, 1.0, 1.0], &[4.0]);
        assert!(matches!(r, Err(DriftError::InvalidInput(_))));
    }
}
