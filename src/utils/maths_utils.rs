/// `num / den`, or 0.0 when the denominator is zero.
#[inline]
pub fn safe_ratio(num: f64, den: f64) -> f64 {
    if den.abs() <= f64::EPSILON {
        0.0
    } else {
        num / den
    }
}

/// Harmonic mean of precision and recall, 0.0 when both are zero.
#[inline]
pub fn f1_from(precision: f64, recall: f64) -> f64 {
    safe_ratio(2.0 * precision * recall, precision + recall)
}

#[inline]
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio_zero_denominator() {
        assert_eq!(safe_ratio(3.0, 0.0), 0.0);
        assert_eq!(safe_ratio(3.0, 4.0), 0.75);
    }

    #[test]
    fn test_f1_from() {
        assert_eq!(f1_from(0.0, 0.0), 0.0);
        assert!((f1_from(0.5, 1.0) - 2.0 / 3.0).abs() < 1e-12);
    }
}
