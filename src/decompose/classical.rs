//! Classical seasonal decomposition by moving averages.

use crate::core::TimeSeries;
use crate::decompose::transform::{boxcox, guerrero_lambda};
use crate::error::{AnalysisError, Result};
use crate::utils::stats::mean_ignoring_nan;

/// How the components combine to reproduce the original series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionMode {
    /// original = trend + seasonal + remainder.
    #[default]
    Additive,
    /// original = trend * seasonal * remainder. Requires positive data.
    Multiplicative,
    /// Search for a Box-Cox lambda that stabilizes the variance, apply
    /// it, then decompose additively on the transformed scale.
    AutoTransform,
}

/// Result of a classical decomposition.
///
/// All three component sequences have the length of the input. Positions
/// within half a moving-average window of either boundary have no
/// defined trend and are reported as NaN — never as zero — and the
/// remainder is NaN wherever the trend is.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Smoothed trend component (NaN at the edges).
    pub trend: Vec<f64>,
    /// Seasonal component, one cycle tiled to the full length.
    pub seasonal: Vec<f64>,
    /// What remains after removing trend and seasonal.
    pub remainder: Vec<f64>,
    /// The mode the components combine under.
    pub mode: DecompositionMode,
    /// Box-Cox lambda applied before decomposing (AutoTransform only).
    /// Components are on the transformed scale; invert with
    /// [`crate::decompose::inv_boxcox`].
    pub lambda: Option<f64>,
}

impl Decomposition {
    /// Seasonal indices for one cycle.
    pub fn seasonal_cycle(&self, frequency: usize) -> &[f64] {
        &self.seasonal[..frequency.min(self.seasonal.len())]
    }

    /// Fraction of (seasonal + remainder) variance explained by the
    /// seasonal component, in [0, 1]. Computed over indices where the
    /// remainder is defined.
    pub fn seasonal_strength(&self) -> f64 {
        let pairs: Vec<(f64, f64)> = self
            .seasonal
            .iter()
            .zip(self.remainder.iter())
            .filter(|(s, r)| !s.is_nan() && !r.is_nan())
            .map(|(&s, &r)| (s, r))
            .collect();
        component_strength(&pairs)
    }

    /// Fraction of (trend + remainder) variance explained by the trend
    /// component, in [0, 1].
    pub fn trend_strength(&self) -> f64 {
        let pairs: Vec<(f64, f64)> = self
            .trend
            .iter()
            .zip(self.remainder.iter())
            .filter(|(t, r)| !t.is_nan() && !r.is_nan())
            .map(|(&t, &r)| (t, r))
            .collect();
        component_strength(&pairs)
    }
}

fn component_strength(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }
    let residual: Vec<f64> = pairs.iter().map(|&(_, r)| r).collect();
    let combined: Vec<f64> = pairs.iter().map(|&(c, r)| c + r).collect();
    let var_r = population_variance(&residual);
    let var_cr = population_variance(&combined);
    if var_cr < 1e-10 {
        return 0.0;
    }
    (1.0 - var_r / var_cr).clamp(0.0, 1.0)
}

fn population_variance(values: &[f64]) -> f64 {
    let m = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Decompose a series into trend, seasonal, and remainder components.
///
/// Trend is a centered moving average over one cycle (a two-pass 2xF
/// average when the frequency is even), the seasonal component is the
/// centered average of detrended values by position within the cycle,
/// and the remainder is whatever the first two leave unexplained.
///
/// # Errors
/// * `InvalidParameter` if the series frequency is < 2 (no seasonality
///   to decompose).
/// * `InsufficientData` if the series is shorter than two full cycles.
/// * `DegenerateInput` for multiplicative or auto-transform modes on
///   non-positive data.
pub fn classical_decomposition(
    series: &TimeSeries,
    mode: DecompositionMode,
) -> Result<Decomposition> {
    let frequency = series.frequency();
    if frequency < 2 {
        return Err(AnalysisError::InvalidParameter(
            "decomposition requires a frequency of at least 2".to_string(),
        ));
    }
    series.require_min_len(2 * frequency)?;

    match mode {
        DecompositionMode::Additive => decompose_core(series.values(), frequency, false, None),
        DecompositionMode::Multiplicative => {
            if series.values().iter().any(|&v| v <= 0.0) {
                return Err(AnalysisError::DegenerateInput(
                    "multiplicative decomposition requires positive values".to_string(),
                ));
            }
            decompose_core(series.values(), frequency, true, None)
        }
        DecompositionMode::AutoTransform => {
            let lambda = guerrero_lambda(series.values(), frequency)?;
            let transformed = boxcox(series.values(), lambda)?;
            decompose_core(&transformed, frequency, false, Some(lambda))
        }
    }
}

fn decompose_core(
    values: &[f64],
    frequency: usize,
    multiplicative: bool,
    lambda: Option<f64>,
) -> Result<Decomposition> {
    let n = values.len();
    let trend = centered_moving_average(values, frequency);

    // Detrend where the trend is defined
    let detrended: Vec<f64> = values
        .iter()
        .zip(trend.iter())
        .map(|(&v, &t)| {
            if t.is_nan() {
                f64::NAN
            } else if multiplicative {
                v / t
            } else {
                v - t
            }
        })
        .collect();

    // Average by position within the cycle, then center so the seasonal
    // component sums to zero (additive) or averages to one
    // (multiplicative) over a full cycle.
    let mut indices = vec![0.0; frequency];
    for (pos, index) in indices.iter_mut().enumerate() {
        let at_pos: Vec<f64> = detrended.iter().skip(pos).step_by(frequency).copied().collect();
        *index = mean_ignoring_nan(&at_pos);
    }
    let center = indices.iter().sum::<f64>() / frequency as f64;
    for index in indices.iter_mut() {
        if multiplicative {
            *index /= center;
        } else {
            *index -= center;
        }
    }

    let seasonal: Vec<f64> = (0..n).map(|i| indices[i % frequency]).collect();

    let remainder: Vec<f64> = (0..n)
        .map(|i| {
            if trend[i].is_nan() {
                f64::NAN
            } else if multiplicative {
                values[i] / (trend[i] * seasonal[i])
            } else {
                values[i] - trend[i] - seasonal[i]
            }
        })
        .collect();

    Ok(Decomposition {
        trend,
        seasonal,
        remainder,
        mode: if lambda.is_some() {
            DecompositionMode::AutoTransform
        } else if multiplicative {
            DecompositionMode::Multiplicative
        } else {
            DecompositionMode::Additive
        },
        lambda,
    })
}

/// Centered moving average of window `frequency`.
///
/// For odd frequency this is a single symmetric window; for even
/// frequency a second two-point pass re-centers the average (the 2xF
/// moving average), so the result aligns with observation times.
/// Positions whose window would cross a boundary are NaN.
fn centered_moving_average(values: &[f64], frequency: usize) -> Vec<f64> {
    let n = values.len();
    let mut trend = vec![f64::NAN; n];

    if frequency % 2 == 1 {
        let half = frequency / 2;
        for i in half..n.saturating_sub(half) {
            let window = &values[i - half..=i + half];
            trend[i] = window.iter().sum::<f64>() / frequency as f64;
        }
    } else {
        // First pass: frequency-length averages at half-integer offsets;
        // second pass: average adjacent pairs to re-center.
        let half = frequency / 2;
        let first: Vec<f64> = values
            .windows(frequency)
            .map(|w| w.iter().sum::<f64>() / frequency as f64)
            .collect();
        for i in half..n.saturating_sub(half) {
            trend[i] = (first[i - half] + first[i - half + 1]) / 2.0;
        }
    }
    trend
}
