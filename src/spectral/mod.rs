//! Smoothed periodogram spectral analysis.
//!
//! Estimates the power spectrum of a series: demean, optionally remove
//! a linear trend, taper the ends, FFT, then smooth the raw periodogram
//! with modified Daniell kernels. Confidence intervals come from the
//! chi-squared distribution with the kernel's equivalent degrees of
//! freedom.
//!
//! Power values are comparable between series analyzed with the SAME
//! settings; changing the taper or smoothing spans rescales the
//! spectrum, so do not compare power across different configurations.

use crate::error::{AnalysisError, Result};
use crate::utils::stats::mean;
use rustfft::{num_complex::Complex64, FftPlanner};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::f64::consts::PI;

/// End-taper applied before the FFT to reduce spectral leakage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Taper {
    /// No tapering.
    None,
    /// Split cosine bell over the given proportion of the series
    /// (half at each end).
    CosineBell { proportion: f64 },
}

impl Default for Taper {
    fn default() -> Self {
        Taper::CosineBell { proportion: 0.1 }
    }
}

/// Parameters for spectrum estimation.
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    /// End taper, cosine bell over 10% by default.
    pub taper: Taper,
    /// Remove a least-squares line before transforming. On by default;
    /// an unremoved trend leaks power into the lowest frequencies.
    pub detrend: bool,
    /// Spans of successive modified Daniell smoothers. Empty means the
    /// raw periodogram.
    pub smoothing_spans: Vec<usize>,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            taper: Taper::default(),
            detrend: true,
            smoothing_spans: Vec::new(),
        }
    }
}

impl SpectrumConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_taper(mut self, taper: Taper) -> Self {
        self.taper = taper;
        self
    }

    pub fn with_detrend(mut self, detrend: bool) -> Self {
        self.detrend = detrend;
        self
    }

    /// Smooth with one or more modified Daniell passes of the given
    /// spans. Larger spans give a smoother, lower-variance estimate.
    pub fn with_smoothing_spans(mut self, spans: Vec<usize>) -> Self {
        self.smoothing_spans = spans;
        self
    }

    fn validate(&self) -> Result<()> {
        if let Taper::CosineBell { proportion } = self.taper {
            if !(0.0..=1.0).contains(&proportion) || !proportion.is_finite() {
                return Err(AnalysisError::InvalidParameter(format!(
                    "taper proportion must be in [0, 1], got {proportion}"
                )));
            }
        }
        if self.smoothing_spans.iter().any(|&s| s == 0) {
            return Err(AnalysisError::InvalidParameter(
                "smoothing spans must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A dominant cycle in the spectrum.
#[derive(Debug, Clone, Copy)]
pub struct SpectralPeak {
    /// Frequency in cycles per observation.
    pub frequency: f64,
    /// Estimated power at the peak.
    pub power: f64,
    /// Cycle length in observations, 1 / frequency.
    pub cycle_length: f64,
}

/// An estimated power spectrum.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Frequencies k / n in cycles per observation, k = 1 ..= n/2.
    /// Frequency zero is excluded; the series is demeaned anyway.
    pub frequencies: Vec<f64>,
    /// Power estimates, one per frequency.
    pub power: Vec<f64>,
    /// Equivalent degrees of freedom of each estimate (2 for the raw
    /// periodogram, more after smoothing).
    pub degrees_of_freedom: f64,
    /// Bandwidth of the effective smoothing kernel, in frequency units.
    pub bandwidth: f64,
}

impl Spectrum {
    /// Chi-squared confidence interval for the true spectrum at a point
    /// with the given estimated power.
    ///
    /// # Errors
    /// `InvalidParameter` if the level is outside (0, 1).
    pub fn confidence_interval(&self, power: f64, level: f64) -> Result<(f64, f64)> {
        if !(0.0 < level && level < 1.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }
        let df = self.degrees_of_freedom;
        let chi = ChiSquared::new(df).map_err(|e| {
            AnalysisError::InvalidParameter(format!("invalid degrees of freedom {df}: {e}"))
        })?;
        let alpha = 1.0 - level;
        let upper_q = chi.inverse_cdf(1.0 - alpha / 2.0);
        let lower_q = chi.inverse_cdf(alpha / 2.0);
        Ok((df * power / upper_q, df * power / lower_q))
    }

    /// The single highest-power frequency, if any.
    pub fn dominant_peak(&self) -> Option<SpectralPeak> {
        self.peaks(1).into_iter().next()
    }

    /// Up to `max` local maxima of the spectrum, highest power first.
    /// Endpoints count as peaks when they exceed their single neighbor.
    pub fn peaks(&self, max: usize) -> Vec<SpectralPeak> {
        let n = self.power.len();
        if n == 0 || max == 0 {
            return Vec::new();
        }
        let mut found: Vec<SpectralPeak> = (0..n)
            .filter(|&k| {
                let left_ok = k == 0 || self.power[k] > self.power[k - 1];
                let right_ok = k == n - 1 || self.power[k] > self.power[k + 1];
                left_ok && right_ok
            })
            .map(|k| SpectralPeak {
                frequency: self.frequencies[k],
                power: self.power[k],
                cycle_length: 1.0 / self.frequencies[k],
            })
            .collect();
        found.sort_by(|a, b| b.power.total_cmp(&a.power));
        found.truncate(max);
        found
    }
}

/// Estimate the power spectrum of a series.
///
/// # Errors
/// * `InsufficientData` with fewer than 4 observations.
/// * `InvalidParameter` for a bad taper proportion or zero smoothing
///   span.
pub fn periodogram(values: &[f64], config: &SpectrumConfig) -> Result<Spectrum> {
    config.validate()?;
    if values.len() < 4 {
        return Err(AnalysisError::InsufficientData {
            needed: 4,
            got: values.len(),
        });
    }
    let n = values.len();

    let mut work: Vec<f64> = if config.detrend {
        detrend_linear(values)
    } else {
        let m = mean(values);
        values.iter().map(|&v| v - m).collect()
    };

    let taper_weights = taper_weights(n, config.taper);
    if let Some(weights) = &taper_weights {
        for (v, w) in work.iter_mut().zip(weights.iter()) {
            *v *= w;
        }
    }

    let mut buffer: Vec<Complex64> = work.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    // Raw periodogram at the Fourier frequencies k/n, k = 1..=n/2,
    // normalized by the tapered series' effective length so power stays
    // comparable across taper settings of the same shape.
    let norm = match &taper_weights {
        Some(weights) => weights.iter().map(|w| w * w).sum::<f64>(),
        None => n as f64,
    };
    let half = n / 2;
    let frequencies: Vec<f64> = (1..=half).map(|k| k as f64 / n as f64).collect();
    let mut power: Vec<f64> = (1..=half).map(|k| buffer[k].norm_sqr() / norm).collect();

    let mut degrees_of_freedom = 2.0;
    let mut kernel = vec![1.0];
    for &span in &config.smoothing_spans {
        power = daniell_smooth(&power, span);
        kernel = convolve(&kernel, &daniell_weights(span));
    }
    if !config.smoothing_spans.is_empty() {
        let sum_sq: f64 = kernel.iter().map(|w| w * w).sum();
        degrees_of_freedom = 2.0 / sum_sq;
    }
    let bandwidth = kernel_bandwidth(&kernel) / n as f64;

    Ok(Spectrum {
        frequencies,
        power,
        degrees_of_freedom,
        bandwidth,
    })
}

fn detrend_linear(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mx = (n - 1.0) / 2.0;
    let my = mean(values);
    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for (i, &v) in values.iter().enumerate() {
        let dx = i as f64 - mx;
        ss_xx += dx * dx;
        ss_xy += dx * (v - my);
    }
    let slope = if ss_xx > 0.0 { ss_xy / ss_xx } else { 0.0 };
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| v - my - slope * (i as f64 - mx))
        .collect()
}

/// Split cosine bell: ramps over `proportion / 2` of the series at each
/// end, flat in the middle. Returns None when no tapering applies.
fn taper_weights(n: usize, taper: Taper) -> Option<Vec<f64>> {
    let proportion = match taper {
        Taper::None => return None,
        Taper::CosineBell { proportion } => proportion,
    };
    let m = ((n as f64 * proportion) / 2.0).floor() as usize;
    if m == 0 {
        return None;
    }
    let mut weights = vec![1.0; n];
    for i in 0..m {
        let w = 0.5 * (1.0 - (PI * (i as f64 + 0.5) / m as f64).cos());
        weights[i] = w;
        weights[n - 1 - i] = w;
    }
    Some(weights)
}

/// Weights of a single modified Daniell smoother of the given span:
/// uniform 1/(2 span) with half weight at both ends.
fn daniell_weights(span: usize) -> Vec<f64> {
    let len = 2 * span + 1;
    let mut weights = vec![1.0 / (2.0 * span as f64); len];
    weights[0] /= 2.0;
    weights[len - 1] /= 2.0;
    weights
}

/// Apply one modified Daniell pass. Near the edges the kernel is
/// clipped and renormalized rather than reflected.
fn daniell_smooth(power: &[f64], span: usize) -> Vec<f64> {
    let weights = daniell_weights(span);
    let n = power.len();
    let half = span as isize;
    (0..n as isize)
        .map(|k| {
            let mut acc = 0.0;
            let mut wsum = 0.0;
            for (j, &w) in weights.iter().enumerate() {
                let idx = k + j as isize - half;
                if idx >= 0 && idx < n as isize {
                    acc += w * power[idx as usize];
                    wsum += w;
                }
            }
            acc / wsum
        })
        .collect()
}

fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Bandwidth of a symmetric kernel in bin units: spread of the kernel
/// treated as a distribution over offsets, plus the width of a single
/// bin.
fn kernel_bandwidth(kernel: &[f64]) -> f64 {
    let half = (kernel.len() - 1) as f64 / 2.0;
    let spread: f64 = kernel
        .iter()
        .enumerate()
        .map(|(j, &w)| w * (j as f64 - half).powi(2))
        .sum();
    (1.0 / 12.0 + spread).sqrt()
}
