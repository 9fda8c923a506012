use crate::errors::DriftError;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

// Validation
/// Check that a sample is usable for statistics: non-empty and finite.
///
/// * `values` - The sample to check.
/// * `label` - Name used in the error message, e.g. `"reference sample for fare_amount"`.
pub fn validate_sample(values: &[f64], label: &str) -> Result<(), DriftError> {
    if values.is_empty() {
        return Err(DriftError::InvalidInput(format!("{} is empty", label)));
    }
    if let Some((idx, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(DriftError::InvalidInput(format!(
            "{} contains non-finite value {} at position {}",
            label, v, idx
        )));
    }
    Ok(())
}

pub fn validate_positive_parameter(value: usize, parameter: &str) -> Result<(), DriftError> {
    if value == 0 {
        Err(DriftError::InvalidParameter(
            parameter.to_string(),
            "a positive integer".to_string(),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Sorted copy of a sample. Values are assumed finite.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Greatest common divisor.
#[inline]
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_to_strings() {
        assert_eq!(items_to_strings(vec!["Auto", "Exact"]), "Auto, Exact, ");
    }

    #[test]
    fn test_validate_sample() {
        assert!(validate_sample(&[1.0, 2.0], "x").is_ok());
        assert!(matches!(validate_sample(&[], "x"), Err(DriftError::InvalidInput(_))));
        assert!(matches!(
            validate_sample(&[1.0, f64::NAN], "x"),
            Err(DriftError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_sample(&[f64::NEG_INFINITY], "x"),
            Err(DriftError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_positive_parameter() {
        assert!(validate_positive_parameter(1, "rows").is_ok());
        assert!(validate_positive_parameter(0, "rows").is_err());
    }

    #[test]
    fn test_sorted_copy() {
        assert_eq!(sorted_copy(&[3.0, -1.0, 2.0]), vec![-1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(5, 5), 5);
        assert_eq!(gcd(3, 2), 1);
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 0), 7);
    }
}
