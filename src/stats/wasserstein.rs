use crate::utils::sorted_copy;

/// 1-D Wasserstein (earth mover's) distance between two samples with uniform weights.
///
/// Both samples must be non-empty and finite.
pub fn wasserstein_distance(u: &[f64], v: &[f64]) -> f64 {
    let u = sorted_copy(u);
    let v = sorted_copy(v);
    wasserstein_distance_sorted(&u, &v)
}

/// Same as [`wasserstein_distance`] for samples already sorted in ascending order.
///
/// Sweeps the merged support once. Between two consecutive support points the
/// ECDFs are constant, so each gap contributes `|F_u - F_v| * width`.
pub fn wasserstein_distance_sorted(u: &[f64], v: &[f64]) -> f64 {
    let (n, m) = (u.len(), v.len());
    let (nf, mf) = (n as f64, m as f64);
    let (mut i, mut j) = (0, 0);
    let mut prev: Option<f64> = None;
    let mut total = 0.0;

    while i < n || j < m {
        let x = match (u.get(i), v.get(j)) {
            (Some(&a), Some(&b)) => a.min(b),
            (Some(&a), None) => a,
            (None, Some(&b)) => b,
            (None, None) => break,
        };
        if let Some(p) = prev {
            let gap = (i as f64 / nf - j as f64 / mf).abs();
            total += gap * (x - p);
        }
        while i < n && u[i] <= x {
            i += 1;
        }
        while j < m && v[j] <= x {
            j += 1;
        }
        prev = Some(x);
    }

    total
}
