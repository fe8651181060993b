//! Small statistical helpers shared by the estimators.

use ndarray::Array1;

pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Population standard deviation around a precomputed mean.
pub fn std_dev(x: &[f64], mean: f64) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / x.len() as f64;
    var.sqrt()
}

/// Subtract the series mean, leaving only the oscillatory component.
pub fn remove_mean(x: &Array1<f32>) -> Array1<f32> {
    let m = x.mean().unwrap_or(0.0);
    x.mapv(|v| v - m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn mean_and_std_of_known_series() {
        let x = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&x);
        assert_relative_eq!(m, 5.0);
        assert_relative_eq!(std_dev(&x, m), 2.0);
    }

    #[test]
    fn empty_series_is_harmless() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[], 0.0), 0.0);
    }

    #[test]
    fn remove_mean_centers_the_series() {
        let x = array![1.0f32, 2.0, 3.0];
        let centered = remove_mean(&x);
        assert_relative_eq!(centered.sum(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(centered[0], -1.0, epsilon = 1e-6);
    }
}
