//! Trend estimation: local smoothing, quantile regression, OLS, and
//! segmented linear fits.

mod loess;
mod ols;
mod quantile;
mod segmented;

pub use loess::{loess, loess_xy, LoessConfig, WeightKernel};
pub use ols::{ols_line, ols_line_indices, LinearFit};
pub use quantile::{quantile_regression, QuantileConfig, QuantileLine};
pub use segmented::{segmented_fit, KnotEstimate, SegmentedConfig, SegmentedFit};

use crate::error::Result;

/// A fitted trend, tagged by estimator.
#[derive(Debug, Clone)]
pub enum TrendFit {
    /// Loess smoothing: one fitted value per input position.
    Smoothed(Vec<f64>),
    /// Quantile regression: one line per requested level.
    QuantileFit(Vec<QuantileLine>),
    /// Ordinary least squares line.
    LinearFit(LinearFit),
    /// Piecewise linear fit with estimated breakpoints.
    SegmentedFit(SegmentedFit),
}

/// Estimator selection for [`fit_trend`].
#[derive(Debug, Clone)]
pub enum TrendMethod {
    /// Loess smoothing with the given configuration.
    Loess(LoessConfig),
    /// Quantile regression at the configured levels.
    Quantile(QuantileConfig),
    /// Ordinary least squares line.
    Linear,
    /// Segmented linear fit with estimated breakpoints.
    Segmented(SegmentedConfig),
}

/// Fit a trend to values observed at indices 0, 1, 2, ... with the
/// chosen estimator, returning the result tagged by estimator.
///
/// # Errors
/// Whatever the selected estimator reports for the given data.
pub fn fit_trend(y: &[f64], method: &TrendMethod) -> Result<TrendFit> {
    match method {
        TrendMethod::Loess(config) => Ok(TrendFit::Smoothed(loess(y, config)?)),
        TrendMethod::Quantile(config) => {
            let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
            Ok(TrendFit::QuantileFit(quantile_regression(&x, y, config)?))
        }
        TrendMethod::Linear => Ok(TrendFit::LinearFit(ols_line_indices(y)?)),
        TrendMethod::Segmented(config) => {
            let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
            Ok(TrendFit::SegmentedFit(segmented_fit(&x, y, config)?))
        }
    }
}
