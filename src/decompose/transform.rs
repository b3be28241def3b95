//! Variance-stabilizing power transforms.
//!
//! Box-Cox family: lambda = 0 is the logarithm, lambda = 1 the identity
//! (up to a shift). Lambda selection uses Guerrero's method — minimize
//! the coefficient of variation of the scaled spread across sub-periods
//! of one seasonal cycle — which targets exactly the failure mode that
//! motivates transforming before decomposition: spread growing with
//! level.

use crate::error::{AnalysisError, Result};
use crate::utils::stats::{mean, std_dev};

/// Apply the Box-Cox transform with a fixed lambda.
///
/// For lambda != 0: y = (x^lambda - 1) / lambda; for lambda == 0: y = ln x.
///
/// # Errors
/// `DegenerateInput` if any value is non-positive; the transform is only
/// defined on positive data and substituting a placeholder would corrupt
/// downstream decomposition.
pub fn boxcox(series: &[f64], lambda: f64) -> Result<Vec<f64>> {
    if let Some(bad) = series.iter().find(|&&x| x <= 0.0 || !x.is_finite()) {
        return Err(AnalysisError::DegenerateInput(format!(
            "Box-Cox requires positive finite values, found {bad}"
        )));
    }
    Ok(series
        .iter()
        .map(|&x| {
            if lambda.abs() < 1e-10 {
                x.ln()
            } else {
                (x.powf(lambda) - 1.0) / lambda
            }
        })
        .collect())
}

/// Invert the Box-Cox transform.
///
/// For lambda != 0: x = (lambda * y + 1)^(1/lambda); for lambda == 0:
/// x = exp(y). Values where the inverse is undefined come back as NaN.
pub fn inv_boxcox(transformed: &[f64], lambda: f64) -> Vec<f64> {
    transformed
        .iter()
        .map(|&y| {
            if lambda.abs() < 1e-10 {
                y.exp()
            } else {
                let val = lambda * y + 1.0;
                if val <= 0.0 {
                    f64::NAN
                } else {
                    val.powf(1.0 / lambda)
                }
            }
        })
        .collect()
}

/// Select a Box-Cox lambda by Guerrero's coefficient-of-variation method.
///
/// The series is split into consecutive sub-periods of `frequency`
/// observations. For each candidate lambda on a [-1, 2] grid, the ratio
/// sd_h / mean_h^(1 - lambda) is computed per sub-period; the lambda
/// whose ratios have the smallest coefficient of variation wins. Ratios
/// that are stable across levels mean the transform has decoupled spread
/// from level.
///
/// # Errors
/// * `InvalidParameter` if `frequency < 2`.
/// * `InsufficientData` with fewer than two complete sub-periods.
/// * `DegenerateInput` for non-positive data.
pub fn guerrero_lambda(series: &[f64], frequency: usize) -> Result<f64> {
    if frequency < 2 {
        return Err(AnalysisError::InvalidParameter(
            "frequency must be at least 2 for sub-period lambda selection".to_string(),
        ));
    }
    if series.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
        return Err(AnalysisError::DegenerateInput(
            "Guerrero lambda selection requires positive finite values".to_string(),
        ));
    }
    let chunks: Vec<&[f64]> = series.chunks_exact(frequency).collect();
    if chunks.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2 * frequency,
            got: series.len(),
        });
    }

    let means: Vec<f64> = chunks.iter().map(|c| mean(c)).collect();
    let sds: Vec<f64> = chunks.iter().map(|c| std_dev(c)).collect();

    let mut best_lambda = 1.0;
    let mut best_cv = f64::INFINITY;

    // Grid search over [-1, 2] in 0.05 steps
    for i in -20..=40 {
        let lambda = i as f64 / 20.0;
        let ratios: Vec<f64> = means
            .iter()
            .zip(sds.iter())
            .map(|(&m, &s)| s / m.powf(1.0 - lambda))
            .collect();
        let ratio_mean = mean(&ratios);
        if ratio_mean.abs() < 1e-12 {
            // Spread is zero in every sub-period: any lambda works.
            continue;
        }
        let cv = std_dev(&ratios) / ratio_mean;
        if cv.is_finite() && cv < best_cv {
            best_cv = cv;
            best_lambda = lambda;
        }
    }

    Ok(best_lambda)
}
