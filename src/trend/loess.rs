//! Locally weighted regression (loess) smoothing.

use crate::error::{AnalysisError, Result};
use crate::utils::linalg::weighted_least_squares;

/// Weight kernel applied to scaled neighbor distances in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightKernel {
    /// Tricube: (1 - u^3)^3, the classical loess kernel.
    #[default]
    Tricube,
    /// Epanechnikov: 1 - u^2.
    Epanechnikov,
    /// Uniform: every neighbor weighted equally.
    Uniform,
}

impl WeightKernel {
    fn weight(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        match self {
            WeightKernel::Tricube => {
                let w = 1.0 - u * u * u;
                w * w * w
            }
            WeightKernel::Epanechnikov => 1.0 - u * u,
            WeightKernel::Uniform => 1.0,
        }
    }
}

/// Configuration for loess smoothing.
#[derive(Debug, Clone)]
pub struct LoessConfig {
    /// Fraction of the data in each local neighborhood, in (0, 1].
    pub span: f64,
    /// Degree of the local polynomial (1 or 2).
    pub degree: usize,
    /// Distance weight kernel.
    pub kernel: WeightKernel,
}

impl Default for LoessConfig {
    fn default() -> Self {
        Self {
            span: 0.75,
            degree: 1,
            kernel: WeightKernel::Tricube,
        }
    }
}

impl LoessConfig {
    /// Set the neighborhood span.
    pub fn span(mut self, span: f64) -> Self {
        self.span = span;
        self
    }

    /// Set the local polynomial degree.
    pub fn degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Set the weight kernel.
    pub fn kernel(mut self, kernel: WeightKernel) -> Self {
        self.kernel = kernel;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.span > 0.0 && self.span <= 1.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "span must be in (0, 1], got {}",
                self.span
            )));
        }
        if self.degree == 0 || self.degree > 2 {
            return Err(AnalysisError::InvalidParameter(format!(
                "degree must be 1 or 2, got {}",
                self.degree
            )));
        }
        Ok(())
    }
}

/// Smooth `y` observed at evenly spaced indices 0, 1, 2, ...
pub fn loess(y: &[f64], config: &LoessConfig) -> Result<Vec<f64>> {
    let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    loess_xy(&x, y, config)
}

/// Smooth `y` observed at sorted x positions.
///
/// Fits a weighted local polynomial around each x, using the `span`
/// fraction of nearest neighbors. The neighborhood is clipped at the
/// sequence boundaries, so edge fits lean on one-sided windows rather
/// than extrapolated points. Returns one fitted value per input x.
///
/// # Errors
/// * `InvalidParameter` for a span outside (0, 1], degree outside {1, 2},
///   or unsorted x.
/// * `DimensionMismatch` / `InsufficientData` for malformed inputs.
pub fn loess_xy(x: &[f64], y: &[f64], config: &LoessConfig) -> Result<Vec<f64>> {
    config.validate()?;
    if x.len() != y.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    let n = x.len();
    let min_points = config.degree + 2;
    if n < min_points {
        return Err(AnalysisError::InsufficientData {
            needed: min_points,
            got: n,
        });
    }
    if x.windows(2).any(|w| w[1] < w[0]) {
        return Err(AnalysisError::InvalidParameter(
            "x values must be sorted ascending".to_string(),
        ));
    }

    // Neighborhood size: at least enough points to identify the polynomial.
    let q = ((config.span * n as f64).ceil() as usize)
        .clamp(min_points.min(n), n);

    let mut fitted = Vec::with_capacity(n);
    for i in 0..n {
        let lo = nearest_window(x, i, q);
        fitted.push(fit_local(x, y, i, lo, q, config)?);
    }
    Ok(fitted)
}

/// Start of the window of `q` contiguous points nearest to `x[i]`.
fn nearest_window(x: &[f64], i: usize, q: usize) -> usize {
    let n = x.len();
    let mut lo = i.saturating_sub(q / 2);
    if lo + q > n {
        lo = n - q;
    }
    // Slide toward the true nearest-neighbor window.
    while lo > 0 && x[i] - x[lo - 1] < x[lo + q - 1] - x[i] {
        lo -= 1;
    }
    while lo + q < n && x[lo + q] - x[i] < x[i] - x[lo] {
        lo += 1;
    }
    lo
}

fn fit_local(
    x: &[f64],
    y: &[f64],
    i: usize,
    lo: usize,
    q: usize,
    config: &LoessConfig,
) -> Result<f64> {
    let xs = &x[lo..lo + q];
    let ys = &y[lo..lo + q];
    let xi = x[i];

    let dmax = xs
        .iter()
        .map(|&xj| (xj - xi).abs())
        .fold(0.0_f64, f64::max);

    // All neighbors share one x: the local polynomial collapses to a mean.
    if dmax < 1e-12 {
        return Ok(ys.iter().sum::<f64>() / q as f64);
    }

    let weights: Vec<f64> = xs
        .iter()
        .map(|&xj| config.kernel.weight((xj - xi).abs() / dmax).max(1e-9))
        .collect();

    // Center on xi so the intercept is the fitted value.
    let mut columns = vec![vec![1.0; q]];
    let centered: Vec<f64> = xs.iter().map(|&xj| xj - xi).collect();
    columns.push(centered.clone());
    if config.degree == 2 {
        columns.push(centered.iter().map(|&d| d * d).collect());
    }

    let beta = weighted_least_squares(&columns, ys, &weights).ok_or_else(|| {
        AnalysisError::DegenerateInput("local regression system is singular".to_string())
    })?;
    Ok(beta[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reproduces_a_straight_line_exactly() {
        let y: Vec<f64> = (0..50).map(|i| 1.0 + 0.5 * i as f64).collect();
        let fitted = loess(&y, &LoessConfig::default()).unwrap();

        for (f, yi) in fitted.iter().zip(y.iter()) {
            assert_relative_eq!(f, yi, epsilon = 1e-8);
        }
    }

    #[test]
    fn smooths_toward_the_underlying_curve() {
        // Sine wave with deterministic ripple noise
        let n = 120;
        let y: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / 20.0;
                t.sin() + if i % 2 == 0 { 0.2 } else { -0.2 }
            })
            .collect();

        let fitted = loess(&y, &LoessConfig::default().span(0.2)).unwrap();

        // Smoothed error against the clean curve beats the noisy error
        let clean: Vec<f64> = (0..n).map(|i| (i as f64 / 20.0).sin()).collect();
        let err_raw: f64 = y.iter().zip(&clean).map(|(a, b)| (a - b).abs()).sum();
        let err_fit: f64 = fitted.iter().zip(&clean).map(|(a, b)| (a - b).abs()).sum();
        assert!(err_fit < err_raw * 0.5);
    }

    #[test]
    fn output_length_matches_input() {
        let y: Vec<f64> = (0..37).map(|i| (i as f64).sqrt()).collect();
        for span in [0.1, 0.3, 1.0] {
            let fitted = loess(&y, &LoessConfig::default().span(span)).unwrap();
            assert_eq!(fitted.len(), y.len());
        }
    }

    #[test]
    fn degree_two_tracks_curvature_at_edges() {
        // Quadratic data: degree-2 loess reproduces it exactly
        let y: Vec<f64> = (0..40).map(|i| (i as f64) * (i as f64)).collect();
        let fitted = loess(&y, &LoessConfig::default().degree(2).span(0.5)).unwrap();
        for (f, yi) in fitted.iter().zip(y.iter()) {
            assert_relative_eq!(f, yi, epsilon = 1e-6);
        }
    }

    #[test]
    fn rejects_invalid_span() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        for span in [0.0, -0.5, 1.5] {
            let result = loess(&y, &LoessConfig::default().span(span));
            assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
        }
    }

    #[test]
    fn rejects_invalid_degree() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        for degree in [0, 3] {
            let result = loess(&y, &LoessConfig::default().degree(degree));
            assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
        }
    }

    #[test]
    fn rejects_unsorted_x() {
        let x = vec![0.0, 2.0, 1.0, 3.0];
        let y = vec![0.0, 1.0, 2.0, 3.0];
        assert!(matches!(
            loess_xy(&x, &y, &LoessConfig::default()),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn handles_tied_x_positions() {
        let x = vec![0.0, 0.0, 0.0, 1.0, 1.0, 2.0];
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let fitted = loess_xy(&x, &y, &LoessConfig::default().span(0.5)).unwrap();
        assert_eq!(fitted.len(), 6);
        assert!(fitted.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn kernels_produce_finite_fits() {
        let y: Vec<f64> = (0..30).map(|i| (i as f64 * 0.3).cos()).collect();
        for kernel in [
            WeightKernel::Tricube,
            WeightKernel::Epanechnikov,
            WeightKernel::Uniform,
        ] {
            let fitted = loess(&y, &LoessConfig::default().kernel(kernel)).unwrap();
            assert!(fitted.iter().all(|f| f.is_finite()));
        }
    }
}
