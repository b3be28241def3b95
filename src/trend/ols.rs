//! Ordinary least squares line fitting.
//!
//! The OLS line is the baseline exploratory tool. It assumes a global
//! linear relationship and is therefore the least flexible of the trend
//! estimators here; prefer [`crate::trend::loess`] for exploration and
//! reserve OLS for when a single slope is the quantity of interest.

use crate::error::{AnalysisError, Result};

/// A fitted straight line with its residual spread.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Residual standard error, sqrt(RSS / (n - 2)).
    pub residual_se: f64,
}

impl LinearFit {
    /// Fitted value at `x`.
    pub fn fitted(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Residuals of the fit over paired observations.
    pub fn residuals(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| yi - self.fitted(xi))
            .collect()
    }
}

/// Fit a least-squares line y = intercept + slope * x.
///
/// # Errors
/// * `DimensionMismatch` if `x` and `y` differ in length.
/// * `InsufficientData` if fewer than 3 observations (the residual
///   standard error needs n - 2 degrees of freedom).
/// * `DegenerateInput` if `x` has zero variance.
pub fn ols_line(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    let n = x.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData { needed: 3, got: n });
    }

    let n_f64 = n as f64;
    let mean_x = x.iter().sum::<f64>() / n_f64;
    let mean_y = y.iter().sum::<f64>() / n_f64;

    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        ss_xx += (xi - mean_x) * (xi - mean_x);
        ss_xy += (xi - mean_x) * (yi - mean_y);
    }

    if ss_xx < 1e-12 {
        return Err(AnalysisError::DegenerateInput(
            "zero variance in x: line is not identifiable".to_string(),
        ));
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;

    let rss: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| {
            let r = yi - (intercept + slope * xi);
            r * r
        })
        .sum();
    let residual_se = (rss / (n_f64 - 2.0)).sqrt();

    Ok(LinearFit {
        slope,
        intercept,
        residual_se,
    })
}

/// Fit a least-squares line against observation indices 0, 1, 2, ...
pub fn ols_line_indices(y: &[f64]) -> Result<LinearFit> {
    let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    ols_line(&x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_exact_line() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 2.0 + 3.0 * xi).collect();

        let fit = ols_line(&x, &y).unwrap();
        assert_relative_eq!(fit.slope, 3.0, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.residual_se, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn residual_se_reflects_noise() {
        // y = x with alternating +-1 noise: RSS = n, se = sqrt(n/(n-2))
        let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| xi + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();

        let fit = ols_line(&x, &y).unwrap();
        assert_relative_eq!(fit.slope, 1.0, epsilon = 0.01);
        assert!(fit.residual_se > 0.9 && fit.residual_se < 1.1);
    }

    #[test]
    fn rejects_constant_x() {
        let x = vec![2.0; 10];
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(matches!(
            ols_line(&x, &y),
            Err(AnalysisError::DegenerateInput(_))
        ));
    }

    #[test]
    fn rejects_too_few_points() {
        assert!(matches!(
            ols_line(&[0.0, 1.0], &[0.0, 1.0]),
            Err(AnalysisError::InsufficientData { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn rejects_mismatched_lengths() {
        assert!(matches!(
            ols_line(&[0.0, 1.0, 2.0], &[0.0, 1.0]),
            Err(AnalysisError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn index_variant_matches_explicit_x() {
        let y = vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0];
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let a = ols_line_indices(&y).unwrap();
        let b = ols_line(&x, &y).unwrap();
        assert_relative_eq!(a.slope, b.slope, epsilon = 1e-12);
        assert_relative_eq!(a.intercept, b.intercept, epsilon = 1e-12);
    }

    #[test]
    fn residuals_sum_to_zero() {
        let x: Vec<f64> = (0..15).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 1.0 + 0.5 * xi + (xi * 0.9).sin()).collect();
        let fit = ols_line(&x, &y).unwrap();
        let sum: f64 = fit.residuals(&x, &y).iter().sum();
        assert!(sum.abs() < 1e-8);
    }
}
