//! Statistics on periodic (modulo-period) domains, e.g. clock time.
//!
//! Values that wrap — 23:59 is one minute from 00:01 — cannot be
//! averaged or correlated linearly. These functions map values to angles
//! on the unit circle, compute there, and map back.

use crate::error::{AnalysisError, Result};
use std::f64::consts::TAU;

// Resultant lengths below this are treated as fully cancelling.
const DEGENERATE_RESULTANT: f64 = 1e-9;

fn check_period(period: f64) -> Result<()> {
    if !(period > 0.0) || !period.is_finite() {
        return Err(AnalysisError::InvalidParameter(format!(
            "period must be positive and finite, got {period}"
        )));
    }
    Ok(())
}

fn to_angle(value: f64, period: f64) -> f64 {
    TAU * value / period
}

/// Mean direction of periodic values, expressed back in [0, period).
///
/// Each value is mapped to a unit vector; the resultant vector's angle is
/// the circular mean. When directions cancel (resultant length ~ 0) the
/// mean is undefined and the call fails with `DegenerateInput` — it is
/// never silently reported as 0 or as the linear mean.
pub fn circular_mean(values: &[f64], period: f64) -> Result<f64> {
    check_period(period)?;
    if values.is_empty() {
        return Err(AnalysisError::EmptyData);
    }

    let n = values.len() as f64;
    let (sum_cos, sum_sin) = values.iter().fold((0.0, 0.0), |(c, s), &v| {
        let theta = to_angle(v, period);
        (c + theta.cos(), s + theta.sin())
    });
    let resultant = (sum_cos * sum_cos + sum_sin * sum_sin).sqrt() / n;

    if resultant < DEGENERATE_RESULTANT {
        return Err(AnalysisError::DegenerateInput(
            "directions cancel: circular mean is undefined".to_string(),
        ));
    }

    let mean_angle = sum_sin.atan2(sum_cos);
    Ok((mean_angle / TAU * period).rem_euclid(period))
}

/// Mean resultant length in [0, 1]: 1 for perfectly concentrated values,
/// near 0 for values spread evenly around the circle.
pub fn mean_resultant_length(values: &[f64], period: f64) -> Result<f64> {
    check_period(period)?;
    if values.is_empty() {
        return Err(AnalysisError::EmptyData);
    }
    let n = values.len() as f64;
    let (sum_cos, sum_sin) = values.iter().fold((0.0, 0.0), |(c, s), &v| {
        let theta = to_angle(v, period);
        (c + theta.cos(), s + theta.sin())
    });
    Ok((sum_cos * sum_cos + sum_sin * sum_sin).sqrt() / n)
}

/// Circular-circular correlation coefficient (Fisher-Lee form).
///
/// Correlates the angular deviations of both variables around their
/// circular means. Unlike linear Pearson correlation this respects the
/// wrap: 23.9 and 0.1 on a 24-hour clock are close, not far apart.
///
/// # Errors
/// * `DegenerateInput` if either variable has zero angular variance (or
///   an undefined circular mean).
/// * `DimensionMismatch` / `InsufficientData` for malformed inputs.
pub fn circular_correlation(a: &[f64], b: &[f64], period: f64) -> Result<f64> {
    check_period(period)?;
    if a.len() != b.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    if a.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            got: a.len(),
        });
    }

    let mean_a = to_angle(circular_mean(a, period)?, period);
    let mean_b = to_angle(circular_mean(b, period)?, period);

    let mut num = 0.0;
    let mut den_a = 0.0;
    let mut den_b = 0.0;
    for (&ai, &bi) in a.iter().zip(b.iter()) {
        let sa = (to_angle(ai, period) - mean_a).sin();
        let sb = (to_angle(bi, period) - mean_b).sin();
        num += sa * sb;
        den_a += sa * sa;
        den_b += sb * sb;
    }

    let denom = (den_a * den_b).sqrt();
    if denom < DEGENERATE_RESULTANT {
        return Err(AnalysisError::DegenerateInput(
            "zero angular variance: circular correlation is undefined".to_string(),
        ));
    }
    Ok(num / denom)
}
