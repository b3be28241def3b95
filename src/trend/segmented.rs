//! Segmented (piecewise linear) regression with estimated breakpoints.
//!
//! Implements the iterative linearization of Muggeo: each breakpoint
//! enters the design through a hinge term (x - psi)+ and an indicator
//! term whose coefficient measures the current gap at psi; the gap over
//! the slope change gives a Newton-type update for psi. The estimate can
//! be sensitive to the initial guess when the sample is small or the
//! break is weak, which is why the per-breakpoint standard error is part
//! of the result rather than an optional extra.

use crate::error::{AnalysisError, Result};
use crate::trend::ols::LinearFit;
use crate::utils::linalg::{normal_equations, solve_symmetric, symmetric_inverse_diagonal};

/// Configuration for a segmented linear fit.
#[derive(Debug, Clone)]
pub struct SegmentedConfig {
    /// Initial guesses for the breakpoint x-positions, strictly increasing.
    pub psi_init: Vec<f64>,
    /// Iteration budget.
    pub max_iterations: usize,
    /// Convergence tolerance on the breakpoint position change.
    pub tolerance: f64,
}

impl SegmentedConfig {
    /// Configure a fit with the given initial breakpoint guesses.
    pub fn new(psi_init: Vec<f64>) -> Self {
        Self {
            psi_init,
            max_iterations: 50,
            tolerance: 1e-6,
        }
    }

    /// Set the iteration budget.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// A single estimated breakpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotEstimate {
    /// Estimated breakpoint position on the x axis.
    pub position: f64,
    /// Standard error of the position estimate.
    pub std_error: f64,
}

/// Result of a segmented fit.
#[derive(Debug, Clone)]
pub struct SegmentedFit {
    /// Estimated breakpoints, ascending.
    pub breakpoints: Vec<KnotEstimate>,
    /// Per-segment lines implied by the converged fit, left to right.
    /// The lines join continuously at the knots. A segment holding fewer
    /// than three observations has no residual degrees of freedom and
    /// reports `residual_se` as NaN.
    pub segments: Vec<LinearFit>,
    /// Iterations used until convergence.
    pub iterations: usize,
}

/// Fit a piecewise linear model with iteratively re-estimated breakpoints.
///
/// # Errors
/// * `InvalidParameter` if `psi_init` is empty, not strictly increasing,
///   or outside the interior of the observed x-range.
/// * `InsufficientData` if there are too few observations for the
///   parameter count.
/// * `NotConverged` if the breakpoint updates do not settle within the
///   iteration budget.
/// * `DegenerateInput` if a slope change collapses to zero (the
///   breakpoint is then unidentifiable).
pub fn segmented_fit(x: &[f64], y: &[f64], config: &SegmentedConfig) -> Result<SegmentedFit> {
    if x.len() != y.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    let n = x.len();
    let k = config.psi_init.len();
    if k == 0 {
        return Err(AnalysisError::InvalidParameter(
            "psi_init must contain at least one breakpoint guess".to_string(),
        ));
    }
    if config.psi_init.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AnalysisError::InvalidParameter(
            "psi_init must be strictly increasing".to_string(),
        ));
    }
    // 2 base parameters plus hinge and gap terms per breakpoint, and a
    // little room for the residual variance.
    let needed = 2 * k + 6;
    if n < needed {
        return Err(AnalysisError::InsufficientData { needed, got: n });
    }

    let x_min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if config
        .psi_init
        .iter()
        .any(|&psi| psi <= x_min || psi >= x_max)
    {
        return Err(AnalysisError::InvalidParameter(
            "psi_init must lie strictly inside the observed x-range".to_string(),
        ));
    }

    let mut psi = config.psi_init.clone();
    let span = x_max - x_min;

    for iteration in 1..=config.max_iterations {
        let (beta, inv_diag) = solve_design(x, y, &psi)?;

        // beta layout: [intercept, slope, u_1..u_k, v_1..v_k]
        let mut max_shift = 0.0_f64;
        let mut new_psi = psi.clone();
        for j in 0..k {
            let slope_change = beta[2 + j];
            let gap = beta[2 + k + j];
            if slope_change.abs() < 1e-10 {
                return Err(AnalysisError::DegenerateInput(
                    "slope change at a breakpoint is zero: position unidentifiable".to_string(),
                ));
            }
            let shift = gap / slope_change;
            max_shift = max_shift.max(shift.abs());
            // Keep the updated knot inside the data range.
            new_psi[j] = (psi[j] + shift).clamp(x_min + 1e-3 * span, x_max - 1e-3 * span);
        }
        new_psi.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        psi = new_psi;

        if max_shift < config.tolerance {
            let sigma2 = residual_variance(x, y, &psi, &beta)?;
            let breakpoints = (0..k)
                .map(|j| {
                    let slope_change = beta[2 + j];
                    let gap_var = inv_diag[2 + k + j] * sigma2;
                    KnotEstimate {
                        position: psi[j],
                        std_error: gap_var.max(0.0).sqrt() / slope_change.abs(),
                    }
                })
                .collect();
            let segments = segment_fits(x, y, &psi, &beta);
            return Ok(SegmentedFit {
                breakpoints,
                segments,
                iterations: iteration,
            });
        }
    }

    Err(AnalysisError::NotConverged {
        iterations: config.max_iterations,
    })
}

/// Solve the linearized design for the current psi and return the
/// coefficients together with diag((X'X)^-1) for standard errors.
fn solve_design(x: &[f64], y: &[f64], psi: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = x.len();
    let k = psi.len();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(2 + 2 * k);
    columns.push(vec![1.0; n]);
    columns.push(x.to_vec());
    for &p in psi {
        columns.push(x.iter().map(|&xi| (xi - p).max(0.0)).collect());
    }
    for &p in psi {
        columns.push(x.iter().map(|&xi| if xi > p { -1.0 } else { 0.0 }).collect());
    }

    let (xtx, xty) = normal_equations(&columns, y, None).ok_or_else(|| {
        AnalysisError::DegenerateInput("segmented design matrix is empty".to_string())
    })?;
    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        AnalysisError::DegenerateInput(
            "segmented design matrix is singular (breakpoints too close?)".to_string(),
        )
    })?;
    let inv_diag = symmetric_inverse_diagonal(&xtx).ok_or_else(|| {
        AnalysisError::DegenerateInput("covariance of segmented fit is singular".to_string())
    })?;
    Ok((beta, inv_diag))
}

fn residual_variance(x: &[f64], y: &[f64], psi: &[f64], beta: &[f64]) -> Result<f64> {
    let n = x.len();
    let k = psi.len();
    let p = 2 + 2 * k;
    if n <= p {
        return Err(AnalysisError::InsufficientData { needed: p + 1, got: n });
    }
    let rss: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| {
            // The gap terms are ~0 at convergence; predict from the hinge model.
            let mut fit = beta[0] + beta[1] * xi;
            for (j, &pj) in psi.iter().enumerate() {
                fit += beta[2 + j] * (xi - pj).max(0.0);
            }
            let r = yi - fit;
            r * r
        })
        .sum();
    Ok(rss / (n - p) as f64)
}

/// Per-segment lines read off the converged hinge coefficients.
///
/// Segment j has slope beta[1] plus the slope changes of every knot to
/// its left, with the intercept adjusted so the lines join at the knots.
/// This stays well defined for segments with only one or two
/// observations, where an independent refit would not be; the residual
/// standard error over such a segment is NaN (no residual degrees of
/// freedom), never a fabricated zero.
fn segment_fits(x: &[f64], y: &[f64], psi: &[f64], beta: &[f64]) -> Vec<LinearFit> {
    let k = psi.len();
    let mut fits = Vec::with_capacity(k + 1);
    let mut slope = beta[1];
    let mut intercept = beta[0];

    for j in 0..=k {
        if j > 0 {
            slope += beta[2 + j - 1];
            intercept -= beta[2 + j - 1] * psi[j - 1];
        }
        let lo = if j == 0 { f64::NEG_INFINITY } else { psi[j - 1] };
        let hi = if j == k { f64::INFINITY } else { psi[j] };

        let mut count = 0usize;
        let mut rss = 0.0;
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            if xi > lo && xi <= hi {
                let r = yi - (intercept + slope * xi);
                rss += r * r;
                count += 1;
            }
        }
        let residual_se = if count > 2 {
            (rss / (count - 2) as f64).sqrt()
        } else {
            f64::NAN
        };
        fits.push(LinearFit {
            slope,
            intercept,
            residual_se,
        });
    }
    fits
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Piecewise line: slope 1 up to the knot, slope 3 after, tiny ripple.
    fn hinge_data(n: usize, knot: f64) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| {
                let base = xi + 2.0 * (xi - knot).max(0.0);
                base + if i % 2 == 0 { 0.05 } else { -0.05 }
            })
            .collect();
        (x, y)
    }

    #[test]
    fn recovers_a_pronounced_knot() {
        let (x, y) = hinge_data(100, 50.0);
        let fit = segmented_fit(&x, &y, &SegmentedConfig::new(vec![40.0])).unwrap();

        assert_eq!(fit.breakpoints.len(), 1);
        assert_relative_eq!(fit.breakpoints[0].position, 50.0, epsilon = 0.5);
        assert!(fit.breakpoints[0].std_error >= 0.0);
        assert_eq!(fit.segments.len(), 2);
        assert_relative_eq!(fit.segments[0].slope, 1.0, epsilon = 0.05);
        assert_relative_eq!(fit.segments[1].slope, 3.0, epsilon = 0.05);
    }

    #[test]
    fn estimate_is_stable_across_initial_guesses() {
        let (x, y) = hinge_data(200, 100.0);

        let mut estimates = Vec::new();
        for psi0 in [70.0, 85.0, 100.0, 115.0, 130.0] {
            let fit = segmented_fit(&x, &y, &SegmentedConfig::new(vec![psi0])).unwrap();
            estimates.push(fit.breakpoints[0].position);
        }

        for est in &estimates {
            assert_relative_eq!(*est, estimates[0], epsilon = 1.0);
            assert_relative_eq!(*est, 100.0, epsilon = 1.0);
        }
    }

    #[test]
    fn fits_two_knots() {
        // Slope 0, then 2, then -1
        let x: Vec<f64> = (0..150).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| {
                let base = 2.0 * (xi - 50.0).max(0.0) - 3.0 * (xi - 100.0).max(0.0);
                base + if i % 2 == 0 { 0.02 } else { -0.02 }
            })
            .collect();

        let fit = segmented_fit(&x, &y, &SegmentedConfig::new(vec![40.0, 110.0])).unwrap();
        assert_eq!(fit.breakpoints.len(), 2);
        assert_relative_eq!(fit.breakpoints[0].position, 50.0, epsilon = 1.0);
        assert_relative_eq!(fit.breakpoints[1].position, 100.0, epsilon = 1.0);
        assert_eq!(fit.segments.len(), 3);
    }

    #[test]
    fn handles_a_knot_near_the_boundary() {
        // Only two observations fall after the slope change
        let x: Vec<f64> = (0..=20).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| {
                let base = xi + 2.0 * (xi - 18.5).max(0.0);
                base + if i % 2 == 0 { 0.02 } else { -0.02 }
            })
            .collect();

        let fit = segmented_fit(&x, &y, &SegmentedConfig::new(vec![17.0])).unwrap();
        assert_eq!(fit.segments.len(), 2);
        assert_relative_eq!(fit.breakpoints[0].position, 18.5, epsilon = 0.5);
        assert_relative_eq!(fit.segments[0].slope, 1.0, epsilon = 0.05);
        assert_relative_eq!(fit.segments[1].slope, 3.0, epsilon = 0.1);
        // Two points leave no residual degrees of freedom
        assert!(fit.segments[1].residual_se.is_nan());
        assert!(fit.segments[0].residual_se.is_finite());
    }

    #[test]
    fn segment_lines_join_at_the_knot() {
        let (x, y) = hinge_data(100, 50.0);
        let fit = segmented_fit(&x, &y, &SegmentedConfig::new(vec![40.0])).unwrap();

        let knot = fit.breakpoints[0].position;
        assert_relative_eq!(
            fit.segments[0].fitted(knot),
            fit.segments[1].fitted(knot),
            epsilon = 1e-6
        );
    }

    #[test]
    fn rejects_psi_outside_data_range() {
        let (x, y) = hinge_data(50, 25.0);
        for psi0 in [-5.0, 0.0, 49.0, 60.0] {
            let result = segmented_fit(&x, &y, &SegmentedConfig::new(vec![psi0]));
            assert!(
                matches!(result, Err(AnalysisError::InvalidParameter(_))),
                "psi0 = {psi0} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unsorted_psi_init() {
        let (x, y) = hinge_data(50, 25.0);
        let result = segmented_fit(&x, &y, &SegmentedConfig::new(vec![30.0, 20.0]));
        assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_empty_psi_init() {
        let (x, y) = hinge_data(50, 25.0);
        let result = segmented_fit(&x, &y, &SegmentedConfig::new(vec![]));
        assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn too_few_points_is_insufficient_data() {
        let x = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let y = vec![0.0, 1.0, 2.0, 5.0, 8.0];
        let result = segmented_fit(&x, &y, &SegmentedConfig::new(vec![2.0]));
        assert!(matches!(result, Err(AnalysisError::InsufficientData { .. })));
    }

    #[test]
    fn straight_line_has_unidentifiable_knot() {
        // No slope change anywhere: the gap/slope update divides by ~0
        let x: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 1.0 + 2.0 * xi).collect();
        let result = segmented_fit(&x, &y, &SegmentedConfig::new(vec![30.0]));
        assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));
    }

    #[test]
    fn budget_exhaustion_is_not_converged() {
        let (x, y) = hinge_data(100, 50.0);
        let config = SegmentedConfig::new(vec![20.0])
            .max_iterations(1)
            .tolerance(1e-12);
        assert!(matches!(
            segmented_fit(&x, &y, &config),
            Err(AnalysisError::NotConverged { iterations: 1 })
        ));
    }
}
