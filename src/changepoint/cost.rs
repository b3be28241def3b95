//! Segment cost functions backed by prefix sums.
//!
//! Both models price a segment by its residual sum of squares after
//! fitting the model to that segment alone. Prefix sums make each
//! evaluation O(1), which is what keeps the exact dynamic program over
//! all segmentations affordable.

/// Which per-segment model the cost reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostModel {
    /// Constant level per segment: RSS around the segment mean.
    #[default]
    Mean,
    /// Straight line per segment: RSS around the segment's own OLS fit.
    Linear,
}

impl CostModel {
    /// Parameters estimated per segment (mean: 1, linear: 2). Feeds the
    /// model-size term of the BIC.
    pub(crate) fn params_per_segment(self) -> usize {
        match self {
            CostModel::Mean => 1,
            CostModel::Linear => 2,
        }
    }
}

/// Precomputed prefix sums over a series, supporting O(1) segment costs.
pub(crate) struct SegmentCosts {
    model: CostModel,
    /// cum[i] = sum of values[..i]
    cum: Vec<f64>,
    /// cum_sq[i] = sum of values[..i] squared
    cum_sq: Vec<f64>,
    /// cum_xy[i] = sum of j * values[j] for j in 0..i
    cum_xy: Vec<f64>,
}

impl SegmentCosts {
    pub(crate) fn new(values: &[f64], model: CostModel) -> Self {
        let n = values.len();
        let mut cum = Vec::with_capacity(n + 1);
        let mut cum_sq = Vec::with_capacity(n + 1);
        let mut cum_xy = Vec::with_capacity(n + 1);
        cum.push(0.0);
        cum_sq.push(0.0);
        cum_xy.push(0.0);
        for (j, &v) in values.iter().enumerate() {
            cum.push(cum[j] + v);
            cum_sq.push(cum_sq[j] + v * v);
            cum_xy.push(cum_xy[j] + j as f64 * v);
        }
        Self {
            model,
            cum,
            cum_sq,
            cum_xy,
        }
    }

    /// Mean of the half-open segment `[start, end)`.
    pub(crate) fn segment_mean(&self, start: usize, end: usize) -> f64 {
        (self.cum[end] - self.cum[start]) / (end - start) as f64
    }

    /// RSS of the configured model over `[start, end)`.
    pub(crate) fn cost(&self, start: usize, end: usize) -> f64 {
        match self.model {
            CostModel::Mean => self.mean_cost(start, end),
            CostModel::Linear => self.linear_cost(start, end),
        }
    }

    fn mean_cost(&self, start: usize, end: usize) -> f64 {
        let n = (end - start) as f64;
        let sum = self.cum[end] - self.cum[start];
        let sum_sq = self.cum_sq[end] - self.cum_sq[start];
        (sum_sq - sum * sum / n).max(0.0)
    }

    fn linear_cost(&self, start: usize, end: usize) -> f64 {
        let len = end - start;
        if len < 2 {
            return 0.0;
        }
        let n = len as f64;
        let sum_y = self.cum[end] - self.cum[start];
        let sum_sq = self.cum_sq[end] - self.cum_sq[start];

        // Index sums over start..end in closed form
        let a = start as f64;
        let b = (end - 1) as f64;
        let sum_x = (a + b) * n / 2.0;
        let sum_xx = sum_of_squares_to(end - 1) - if start > 0 { sum_of_squares_to(start - 1) } else { 0.0 };
        let sum_xy = self.cum_xy[end] - self.cum_xy[start];

        let ss_xx = sum_xx - sum_x * sum_x / n;
        let ss_xy = sum_xy - sum_x * sum_y / n;
        let ss_yy = sum_sq - sum_y * sum_y / n;

        if ss_xx < 1e-12 {
            return ss_yy.max(0.0);
        }
        (ss_yy - ss_xy * ss_xy / ss_xx).max(0.0)
    }
}

/// Sum of k^2 for k in 0..=m.
fn sum_of_squares_to(m: usize) -> f64 {
    let m = m as f64;
    m * (m + 1.0) * (2.0 * m + 1.0) / 6.0
}
