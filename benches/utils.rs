#![allow(dead_code)]
use hashbrown::HashMap;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

// two_windows
//
// Generates a (reference, current)-tuple of uniform samples,
// the current window shifted by `shift`
pub(crate) fn two_windows(n_reference: usize, n_current: usize, shift: f64) -> (Vec<f64>, Vec<f64>) {
    // reproducible seed
    let mut rng = StdRng::seed_from_u64(1903);
    let distribution = Uniform::new(0.0, 10.0);

    let reference = (0..n_reference).map(|_| rng.sample(distribution)).collect();
    let current = (0..n_current).map(|_| rng.sample(distribution) + shift).collect();
    (reference, current)
}

// feature_windows
//
// One pair of windows per feature, keyed by `feature_{i}`
pub(crate) fn feature_windows(
    n_samples: usize,
    n_features: usize,
) -> (HashMap<String, Vec<f64>>, HashMap<String, Vec<f64>>, Vec<String>) {
    let mut reference = HashMap::new();
    let mut current = HashMap::new();
    let mut names = Vec::with_capacity(n_features);
    for i in 0..n_features {
        let name = format!("feature_{}", i);
        let (r, c) = two_windows(n_samples, n_samples, i as f64 * 0.5);
        reference.insert(name.clone(), r);
        current.insert(name.clone(), c);
        names.push(name);
    }
    (reference, current, names)
}
