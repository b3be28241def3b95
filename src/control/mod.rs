//! Shewhart attribute control charts for event rates.
//!
//! The u-chart monitors counts per unit of exposure (defects per
//! inspection lot, incidents per machine-hour). Limits are per-point:
//! larger exposures give tighter limits, so the chart stays honest when
//! lot sizes vary.

use crate::error::{AnalysisError, Result};

/// Parameters for a u-chart.
#[derive(Debug, Clone)]
pub struct UChartConfig {
    /// Width of the control limits in standard deviations.
    pub sigma: f64,
}

impl Default for UChartConfig {
    fn default() -> Self {
        Self { sigma: 3.0 }
    }
}

impl UChartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit width in standard deviations.
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.sigma > 0.0) || !self.sigma.is_finite() {
            return Err(AnalysisError::InvalidParameter(format!(
                "sigma must be positive and finite, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// A computed control chart: per-point rates, limits, and signals.
#[derive(Debug, Clone)]
pub struct ControlChart {
    /// Center line: the pooled rate, total counts over total exposure.
    pub center: f64,
    /// Observed rate per point, count / exposure.
    pub rates: Vec<f64>,
    /// Upper control limit per point.
    pub upper: Vec<f64>,
    /// Lower control limit per point, clamped at zero.
    pub lower: Vec<f64>,
    /// Whether each point falls strictly outside its limits.
    pub out_of_control: Vec<bool>,
}

impl ControlChart {
    /// Indices of the points that signal.
    pub fn signals(&self) -> Vec<usize> {
        self.out_of_control
            .iter()
            .enumerate()
            .filter_map(|(i, &out)| out.then_some(i))
            .collect()
    }
}

/// Build a u-chart from event counts and their exposures.
///
/// The center line is the pooled rate u = sum(counts) / sum(exposures);
/// the limits at point i are u +/- sigma * sqrt(u / exposure_i). A rate
/// of exactly zero can never signal low when the lower limit is clamped
/// to zero, which is the standard behavior: an attribute chart cannot
/// distinguish "impossibly good" from "no events yet".
///
/// # Errors
/// * `EmptyData` with no points.
/// * `DimensionMismatch` when counts and exposures differ in length.
/// * `InvalidParameter` for non-positive exposures, negative counts, or
///   a non-positive sigma.
pub fn u_chart(counts: &[f64], exposures: &[f64], config: &UChartConfig) -> Result<ControlChart> {
    config.validate()?;
    if counts.is_empty() {
        return Err(AnalysisError::EmptyData);
    }
    if counts.len() != exposures.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: counts.len(),
            got: exposures.len(),
        });
    }
    if let Some(bad) = exposures.iter().find(|&&e| !(e > 0.0) || !e.is_finite()) {
        return Err(AnalysisError::InvalidParameter(format!(
            "exposures must be positive and finite, got {bad}"
        )));
    }
    if let Some(bad) = counts.iter().find(|&&c| c < 0.0 || !c.is_finite()) {
        return Err(AnalysisError::InvalidParameter(format!(
            "counts must be non-negative and finite, got {bad}"
        )));
    }

    let total_counts: f64 = counts.iter().sum();
    let total_exposure: f64 = exposures.iter().sum();
    let center = total_counts / total_exposure;

    let n = counts.len();
    let mut rates = Vec::with_capacity(n);
    let mut upper = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut out_of_control = Vec::with_capacity(n);

    for i in 0..n {
        let rate = counts[i] / exposures[i];
        let half_width = config.sigma * (center / exposures[i]).sqrt();
        let ucl = center + half_width;
        let lcl = (center - half_width).max(0.0);
        out_of_control.push(rate > ucl || rate < lcl);
        rates.push(rate);
        upper.push(ucl);
        lower.push(lcl);
    }

    Ok(ControlChart {
        center,
        rates,
        upper,
        lower,
        out_of_control,
    })
}
