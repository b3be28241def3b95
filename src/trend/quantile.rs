//! Linear quantile regression via iteratively reweighted least squares.

use crate::error::{AnalysisError, Result};
use crate::trend::ols::ols_line;
use crate::utils::linalg::weighted_least_squares;

/// Configuration for quantile regression.
#[derive(Debug, Clone)]
pub struct QuantileConfig {
    /// Quantile levels to fit, each in (0, 1), strictly increasing.
    pub taus: Vec<f64>,
    /// Iteration budget per quantile level.
    pub max_iterations: usize,
    /// Convergence tolerance on the coefficient change.
    pub tolerance: f64,
}

impl Default for QuantileConfig {
    fn default() -> Self {
        Self {
            taus: vec![0.25, 0.5, 0.75],
            max_iterations: 500,
            tolerance: 1e-6,
        }
    }
}

impl QuantileConfig {
    /// Set the quantile levels.
    pub fn taus(mut self, taus: Vec<f64>) -> Self {
        self.taus = taus;
        self
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

    fn validate(&self) -> Result<()> {
        if self.taus.is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "at least one quantile level is required".to_string(),
            ));
        }
        for &tau in &self.taus {
            if !(tau > 0.0 && tau < 1.0) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "quantile level must be in (0, 1), got {tau}"
                )));
            }
        }
        if self.taus.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnalysisError::InvalidParameter(
                "quantile levels must be strictly increasing".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(AnalysisError::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One fitted conditional quantile line.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileLine {
    /// Quantile level this line estimates.
    pub tau: f64,
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Iterations used by the reweighting loop.
    pub iterations: usize,
}

impl QuantileLine {
    /// Fitted value at `x`.
    pub fn fitted(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

// Residual floor in the IRLS weights; keeps 1/|r| bounded near the fit.
const RESIDUAL_FLOOR: f64 = 1e-6;

/// Fit one linear conditional quantile function per requested tau.
///
/// Minimizes the pinball (check) loss by iteratively reweighted least
/// squares. Fitted lines are not forced to be non-crossing: crossings
/// outside the observed x-range are a known artifact of independent
/// per-tau fits.
///
/// # Errors
/// * `InvalidParameter` for levels outside (0, 1) or not strictly
///   increasing.
/// * `NotConverged` when a level exhausts `max_iterations`.
/// * `DegenerateInput` if `x` has zero variance.
pub fn quantile_regression(
    x: &[f64],
    y: &[f64],
    config: &QuantileConfig,
) -> Result<Vec<QuantileLine>> {
    config.validate()?;
    if x.len() != y.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    if x.len() < 3 {
        return Err(AnalysisError::InsufficientData {
            needed: 3,
            got: x.len(),
        });
    }

    // OLS starting point, shared by every level. Also surfaces a
    // zero-variance x as DegenerateInput before iterating.
    let start = ols_line(x, y)?;

    let ones = vec![1.0; x.len()];
    let columns = [ones, x.to_vec()];

    config
        .taus
        .iter()
        .map(|&tau| fit_one_tau(&columns, y, tau, &start, config))
        .collect()
}

fn fit_one_tau(
    columns: &[Vec<f64>; 2],
    y: &[f64],
    tau: f64,
    start: &crate::trend::ols::LinearFit,
    config: &QuantileConfig,
) -> Result<QuantileLine> {
    let x = &columns[1];
    let mut intercept = start.intercept;
    let mut slope = start.slope;

    for iteration in 1..=config.max_iterations {
        let weights: Vec<f64> = x
            .iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| {
                let r = yi - (intercept + slope * xi);
                let loss_gradient = if r > 0.0 { tau } else { 1.0 - tau };
                loss_gradient / r.abs().max(RESIDUAL_FLOOR)
            })
            .collect();

        let beta = weighted_least_squares(columns, y, &weights).ok_or_else(|| {
            AnalysisError::DegenerateInput(
                "weighted system is singular in quantile regression".to_string(),
            )
        })?;

        let delta = (beta[0] - intercept).abs().max((beta[1] - slope).abs());
        intercept = beta[0];
        slope = beta[1];

        if delta < config.tolerance {
            return Ok(QuantileLine {
                tau,
                slope,
                intercept,
                iterations: iteration,
            });
        }
    }

    Err(AnalysisError::NotConverged {
        iterations: config.max_iterations,
    })
}
