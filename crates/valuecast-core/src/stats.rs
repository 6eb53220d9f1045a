//! NaN-aware summary statistics over `f64` samples, backed by `statrs`.

use statrs::statistics::{Data, OrderStatistics, Statistics};

fn finite_only(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values.into_iter().filter(|value| !value.is_nan()).collect()
}

/// Median of a sample; `None` when empty. NaN values must be filtered by the caller.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    Some(data.median())
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Statistics::mean(values.iter()))
}

/// Smallest and largest value; `None` when empty.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    Some((Statistics::min(values.iter()), Statistics::max(values.iter())))
}

/// Median ignoring NaN; NaN when nothing remains.
pub fn nan_median(values: impl IntoIterator<Item = f64>) -> f64 {
    median(&finite_only(values)).unwrap_or(f64::NAN)
}

/// Mean ignoring NaN; NaN when nothing remains.
pub fn nan_mean(values: impl IntoIterator<Item = f64>) -> f64 {
    mean(&finite_only(values)).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_odd_and_even_lengths() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn min_max_spans_the_sample() {
        assert_eq!(min_max(&[8.0, 12.0, 10.0]), Some((8.0, 12.0)));
        assert_eq!(min_max(&[]), None);
    }

    #[test]
    fn nan_aware_variants_skip_missing() {
        assert_eq!(nan_median([f64::NAN, 1.0, 3.0]), 2.0);
        assert_eq!(nan_mean([f64::NAN, 1.0, 3.0]), 2.0);
        assert!(nan_median([f64::NAN]).is_nan());
        assert!(nan_mean(Vec::new()).is_nan());
    }
}
