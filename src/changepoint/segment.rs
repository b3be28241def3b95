//! Exact multiple-breakpoint detection with BIC model selection.
//!
//! A dynamic program finds, for each candidate count m up to a cap, the
//! segmentation into m + 1 segments with minimum residual sum of
//! squares. The Bayesian information criterion then picks m, accepting
//! an extra breakpoint only when it strictly improves the score, so a
//! series with no structural change comes back with no breakpoints.

use super::cost::{CostModel, SegmentCosts};
use crate::error::{AnalysisError, Result};

const RSS_FLOOR: f64 = 1e-12;

/// Parameters for breakpoint detection.
#[derive(Debug, Clone)]
pub struct BreakpointConfig {
    /// Largest number of breakpoints to consider.
    pub max_breakpoints: usize,
    /// Shortest admissible segment, in observations.
    pub min_segment_length: usize,
    /// Per-segment model priced by the cost function.
    pub model: CostModel,
}

impl Default for BreakpointConfig {
    fn default() -> Self {
        Self {
            max_breakpoints: 5,
            min_segment_length: 2,
            model: CostModel::Mean,
        }
    }
}

impl BreakpointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_breakpoints(mut self, max_breakpoints: usize) -> Self {
        self.max_breakpoints = max_breakpoints;
        self
    }

    pub fn with_min_segment_length(mut self, min_segment_length: usize) -> Self {
        self.min_segment_length = min_segment_length;
        self
    }

    pub fn with_model(mut self, model: CostModel) -> Self {
        self.model = model;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.min_segment_length < 1 {
            return Err(AnalysisError::InvalidParameter(
                "min_segment_length must be at least 1".to_string(),
            ));
        }
        if self.model == CostModel::Linear && self.min_segment_length < 2 {
            return Err(AnalysisError::InvalidParameter(
                "linear segments need min_segment_length of at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// One detected breakpoint.
#[derive(Debug, Clone)]
pub struct Breakpoint {
    /// Index of the first observation of the new regime.
    pub index: usize,
    /// Approximate standard error of the location, in index units.
    /// Infinite when the level shift at the break is negligible.
    pub std_error: f64,
    /// Label of the observation at `index`, when labels were supplied.
    pub label: Option<String>,
}

/// A selected segmentation.
#[derive(Debug, Clone)]
pub struct Breakpoints {
    /// Breakpoints in ascending index order; empty when no change was
    /// worth its BIC cost.
    pub breakpoints: Vec<Breakpoint>,
    /// Half-open `[start, end)` index ranges of the segments.
    pub segments: Vec<(usize, usize)>,
    /// Mean of each segment.
    pub segment_means: Vec<f64>,
    /// BIC of the selected segmentation.
    pub bic: f64,
    /// Residual sum of squares of the selected segmentation.
    pub rss: f64,
}

/// Detect breakpoints in a series.
///
/// Considers every breakpoint count from 0 to `max_breakpoints`,
/// solving each exactly, and returns the count with the best BIC. Ties
/// and non-improvements resolve toward fewer breakpoints.
///
/// # Errors
/// * `EmptyData` on an empty series.
/// * `InsufficientData` when the series cannot hold even one segment of
///   `min_segment_length`.
pub fn detect_breakpoints(values: &[f64], config: &BreakpointConfig) -> Result<Breakpoints> {
    detect(values, None, config)
}

/// Detect breakpoints and attach a label to each from a parallel slice
/// (e.g. formatted dates).
///
/// # Errors
/// `DimensionMismatch` when `labels` is not the same length as `values`,
/// plus everything [`detect_breakpoints`] can return.
pub fn detect_breakpoints_labeled(
    values: &[f64],
    labels: &[String],
    config: &BreakpointConfig,
) -> Result<Breakpoints> {
    if labels.len() != values.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: values.len(),
            got: labels.len(),
        });
    }
    detect(values, Some(labels), config)
}

fn detect(
    values: &[f64],
    labels: Option<&[String]>,
    config: &BreakpointConfig,
) -> Result<Breakpoints> {
    config.validate()?;
    if values.is_empty() {
        return Err(AnalysisError::EmptyData);
    }
    let n = values.len();
    let min_len = config.min_segment_length;
    if n < min_len {
        return Err(AnalysisError::InsufficientData {
            needed: min_len,
            got: n,
        });
    }

    let costs = SegmentCosts::new(values, config.model);
    let p = config.model.params_per_segment();

    // best[j][t]: minimum cost of splitting values[..t] into j segments.
    // Feasibility: t >= j * min_len. back[j][t] holds the split point.
    let max_segments = (config.max_breakpoints + 1).min(n / min_len).max(1);
    let mut best = vec![vec![f64::INFINITY; n + 1]; max_segments + 1];
    let mut back = vec![vec![0usize; n + 1]; max_segments + 1];

    for t in min_len..=n {
        best[1][t] = costs.cost(0, t);
    }
    for j in 2..=max_segments {
        for t in (j * min_len)..=n {
            let mut best_cost = f64::INFINITY;
            let mut best_split = 0;
            for s in ((j - 1) * min_len)..=(t - min_len) {
                let c = best[j - 1][s] + costs.cost(s, t);
                if c < best_cost {
                    best_cost = c;
                    best_split = s;
                }
            }
            best[j][t] = best_cost;
            back[j][t] = best_split;
        }
    }

    // Select the breakpoint count by BIC, requiring strict improvement.
    let mut chosen_segments = 1;
    let mut chosen_bic = bic(n, best[1][n], p, 0);
    for j in 2..=max_segments {
        if !best[j][n].is_finite() {
            continue;
        }
        let candidate = bic(n, best[j][n], p, j - 1);
        if candidate < chosen_bic {
            chosen_bic = candidate;
            chosen_segments = j;
        }
    }

    // Walk back pointers to recover the segmentation.
    let mut bounds = vec![n];
    let mut t = n;
    for j in (2..=chosen_segments).rev() {
        t = back[j][t];
        bounds.push(t);
    }
    bounds.push(0);
    bounds.reverse();

    let segments: Vec<(usize, usize)> = bounds.windows(2).map(|w| (w[0], w[1])).collect();
    let segment_means: Vec<f64> = segments
        .iter()
        .map(|&(s, e)| costs.segment_mean(s, e))
        .collect();

    let rss = best[chosen_segments][n];
    let sigma_sq = rss.max(RSS_FLOOR) / n as f64;

    let breakpoints: Vec<Breakpoint> = segments
        .windows(2)
        .map(|pair| {
            let (left, right) = (pair[0], pair[1]);
            let index = right.0;
            let shift = level_shift(values, config.model, left, right);
            let std_error = if shift.abs() < 1e-12 {
                f64::INFINITY
            } else {
                (sigma_sq / (shift * shift)).sqrt()
            };
            Breakpoint {
                index,
                std_error,
                label: labels.map(|l| l[index].clone()),
            }
        })
        .collect();

    Ok(Breakpoints {
        breakpoints,
        segments,
        segment_means,
        bic: chosen_bic,
        rss,
    })
}

fn bic(n: usize, rss: f64, params_per_segment: usize, n_breakpoints: usize) -> f64 {
    let n_f = n as f64;
    let k = ((n_breakpoints + 1) * params_per_segment + n_breakpoints) as f64;
    n_f * (rss.max(RSS_FLOOR) / n_f).ln() + k * n_f.ln()
}

/// Size of the jump in fitted level at a breakpoint: mean difference for
/// the mean model, gap between the adjoining line fits for the linear
/// model.
fn level_shift(
    values: &[f64],
    model: CostModel,
    left: (usize, usize),
    right: (usize, usize),
) -> f64 {
    match model {
        CostModel::Mean => {
            segment_average(&values[right.0..right.1]) - segment_average(&values[left.0..left.1])
        }
        CostModel::Linear => {
            let boundary = right.0 as f64 - 0.5;
            fitted_at(values, left, boundary) - fitted_at(values, right, boundary)
        }
    }
}

fn segment_average(segment: &[f64]) -> f64 {
    segment.iter().sum::<f64>() / segment.len() as f64
}

fn fitted_at(values: &[f64], range: (usize, usize), x: f64) -> f64 {
    let seg = &values[range.0..range.1];
    let n = seg.len() as f64;
    let mx = (range.0 + range.1 - 1) as f64 / 2.0;
    let my = segment_average(seg);
    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for (offset, &y) in seg.iter().enumerate() {
        let dx = (range.0 + offset) as f64 - mx;
        ss_xx += dx * dx;
        ss_xy += dx * (y - my);
    }
    if ss_xx < 1e-12 || n < 2.0 {
        return my;
    }
    let slope = ss_xy / ss_xx;
    my + slope * (x - mx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn shifted_series() -> Vec<f64> {
        // Level 0 then level 10, with small deterministic wiggle
        (0..100)
            .map(|i| {
                let level = if i < 50 { 0.0 } else { 10.0 };
                level + 0.3 * ((i as f64 * 2.3).sin())
            })
            .collect()
    }

    #[test]
    fn finds_a_single_level_shift() {
        let values = shifted_series();
        let result = detect_breakpoints(&values, &BreakpointConfig::default()).unwrap();

        assert_eq!(result.breakpoints.len(), 1);
        let bp = &result.breakpoints[0];
        assert!(
            (48..=52).contains(&bp.index),
            "breakpoint at {}, expected near 50",
            bp.index
        );
        assert_eq!(result.segments.len(), 2);
        assert!(result.segment_means[0].abs() < 1.0);
        assert!((result.segment_means[1] - 10.0).abs() < 1.0);
    }

    #[test]
    fn constant_series_has_no_breakpoints() {
        let values = vec![5.0; 80];
        let result = detect_breakpoints(&values, &BreakpointConfig::default()).unwrap();
        assert!(result.breakpoints.is_empty());
        assert_eq!(result.segments, vec![(0, 80)]);
        assert_relative_eq!(result.segment_means[0], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn smooth_noise_has_no_breakpoints() {
        let values: Vec<f64> = (0..60).map(|i| 3.0 + 0.1 * (i as f64 * 1.1).sin()).collect();
        let result = detect_breakpoints(&values, &BreakpointConfig::default()).unwrap();
        assert!(result.breakpoints.is_empty());
    }

    #[test]
    fn finds_two_shifts() {
        let mut values = vec![0.0; 40];
        values.extend(vec![8.0; 40]);
        values.extend(vec![-4.0; 40]);
        for (i, v) in values.iter_mut().enumerate() {
            *v += 0.2 * (i as f64 * 0.9).cos();
        }

        let result = detect_breakpoints(&values, &BreakpointConfig::default()).unwrap();
        assert_eq!(result.breakpoints.len(), 2);
        assert!((38..=42).contains(&result.breakpoints[0].index));
        assert!((78..=82).contains(&result.breakpoints[1].index));
    }

    #[test]
    fn linear_model_finds_a_slope_change() {
        // Slope 0.0 then slope 1.0, continuous at the join
        let values: Vec<f64> = (0..120)
            .map(|i| {
                if i < 60 {
                    5.0
                } else {
                    5.0 + (i - 60) as f64
                }
            })
            .enumerate()
            .map(|(i, v)| v + 0.05 * (i as f64 * 2.7).sin())
            .collect();

        let config = BreakpointConfig::default()
            .with_model(CostModel::Linear)
            .with_min_segment_length(5);
        let result = detect_breakpoints(&values, &config).unwrap();
        assert!(!result.breakpoints.is_empty());
        assert!(
            (55..=65).contains(&result.breakpoints[0].index),
            "got {}",
            result.breakpoints[0].index
        );
    }

    #[test]
    fn std_error_shrinks_with_larger_shift() {
        let small: Vec<f64> = (0..80)
            .map(|i| if i < 40 { 0.0 } else { 2.0 } + 0.3 * (i as f64 * 0.8).sin())
            .collect();
        let large: Vec<f64> = (0..80)
            .map(|i| if i < 40 { 0.0 } else { 20.0 } + 0.3 * (i as f64 * 0.8).sin())
            .collect();

        let config = BreakpointConfig::default();
        let se_small = detect_breakpoints(&small, &config).unwrap().breakpoints[0].std_error;
        let se_large = detect_breakpoints(&large, &config).unwrap().breakpoints[0].std_error;
        assert!(se_large < se_small);
    }

    #[test]
    fn labels_are_attached_to_breakpoints() {
        let values = shifted_series();
        let labels: Vec<String> = (0..values.len()).map(|i| format!("t{i}")).collect();

        let result =
            detect_breakpoints_labeled(&values, &labels, &BreakpointConfig::default()).unwrap();
        assert_eq!(result.breakpoints.len(), 1);
        let bp = &result.breakpoints[0];
        assert_eq!(bp.label.as_deref(), Some(format!("t{}", bp.index).as_str()));
    }

    #[test]
    fn label_length_mismatch_is_rejected() {
        let values = shifted_series();
        let labels = vec!["a".to_string(); 3];
        assert!(matches!(
            detect_breakpoints_labeled(&values, &labels, &BreakpointConfig::default()),
            Err(AnalysisError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn respects_max_breakpoints_cap() {
        let mut values = Vec::new();
        for level in [0.0, 10.0, 0.0, 10.0, 0.0, 10.0] {
            values.extend(vec![level; 20]);
        }
        let config = BreakpointConfig::default().with_max_breakpoints(2);
        let result = detect_breakpoints(&values, &config).unwrap();
        assert!(result.breakpoints.len() <= 2);
    }

    #[test]
    fn respects_min_segment_length() {
        let values = shifted_series();
        let config = BreakpointConfig::default().with_min_segment_length(10);
        let result = detect_breakpoints(&values, &config).unwrap();
        for &(start, end) in &result.segments {
            assert!(end - start >= 10);
        }
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(matches!(
            detect_breakpoints(&[], &BreakpointConfig::default()),
            Err(AnalysisError::EmptyData)
        ));
        assert!(matches!(
            detect_breakpoints(&[1.0], &BreakpointConfig::default()),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn rss_and_bic_are_reported() {
        let values = shifted_series();
        let result = detect_breakpoints(&values, &BreakpointConfig::default()).unwrap();
        assert!(result.rss >= 0.0);
        assert!(result.bic.is_finite());
    }
}
