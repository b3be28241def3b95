//! TimeSeries data structure for regularly-spaced observations.

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Utc};

/// A regularly-spaced univariate time series.
///
/// Holds an ordered sequence of observations together with a sampling
/// `frequency`: the number of observations per natural cycle (12 for
/// monthly data with annual seasonality, 7 for daily data with weekly
/// seasonality, 1 for non-seasonal data).
///
/// The series is immutable once constructed; transformations produce a
/// new `TimeSeries` via [`TimeSeries::with_values`]. Indices are
/// positional; any calendar mapping is derived from the optional `start`
/// timestamp, never stored per observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Vec<f64>,
    frequency: usize,
    start: Option<DateTime<Utc>>,
}

impl TimeSeries {
    /// Create a new time series from raw observations.
    ///
    /// # Errors
    /// * `EmptyData` if `values` is empty.
    /// * `InvalidParameter` if `frequency` is zero.
    pub fn new(values: Vec<f64>, frequency: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(AnalysisError::EmptyData);
        }
        if frequency == 0 {
            return Err(AnalysisError::InvalidParameter(
                "frequency must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            values,
            frequency,
            start: None,
        })
    }

    /// Attach a start timestamp (time of the first observation).
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Produce a new series with the same frequency and start but
    /// different values (e.g., after a variance-stabilizing transform).
    ///
    /// # Errors
    /// `DimensionMismatch` if the replacement length differs.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.values.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: self.values.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            values,
            frequency: self.frequency,
            start: self.start,
        })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The observation values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Observations per natural cycle.
    pub fn frequency(&self) -> usize {
        self.frequency
    }

    /// Time of the first observation, if attached.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// Position of observation `i` within its cycle (0..frequency).
    pub fn cycle_position(&self, i: usize) -> usize {
        i % self.frequency
    }

    /// Zero-based cycle number containing observation `i`.
    pub fn cycle_of(&self, i: usize) -> usize {
        i / self.frequency
    }

    /// Number of complete cycles in the series.
    pub fn complete_cycles(&self) -> usize {
        self.values.len() / self.frequency
    }

    /// Fail with `InsufficientData` unless the series has at least
    /// `needed` observations.
    pub fn require_min_len(&self, needed: usize) -> Result<()> {
        if self.values.len() < needed {
            return Err(AnalysisError::InsufficientData {
                needed,
                got: self.values.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn constructs_with_values_and_frequency() {
        let ts = TimeSeries::new(vec![1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(ts.len(), 4);
        assert!(!ts.is_empty());
        assert_eq!(ts.frequency(), 2);
        assert_eq!(ts.values(), &[1.0, 2.0, 3.0, 4.0]);
        assert!(ts.start().is_none());
    }

    #[test]
    fn rejects_empty_values() {
        assert!(matches!(
            TimeSeries::new(vec![], 12),
            Err(AnalysisError::EmptyData)
        ));
    }

    #[test]
    fn rejects_zero_frequency() {
        assert!(matches!(
            TimeSeries::new(vec![1.0, 2.0], 0),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn cycle_arithmetic() {
        let ts = TimeSeries::new((0..30).map(|i| i as f64).collect(), 12).unwrap();
        assert_eq!(ts.cycle_position(0), 0);
        assert_eq!(ts.cycle_position(13), 1);
        assert_eq!(ts.cycle_of(13), 1);
        assert_eq!(ts.complete_cycles(), 2);
    }

    #[test]
    fn with_values_preserves_metadata() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let ts = TimeSeries::new(vec![1.0, 2.0, 3.0], 3)
            .unwrap()
            .with_start(start);

        let transformed = ts.with_values(vec![0.0, 0.5, 1.0]).unwrap();
        assert_eq!(transformed.frequency(), 3);
        assert_eq!(transformed.start(), Some(start));
        assert_eq!(transformed.values(), &[0.0, 0.5, 1.0]);

        // Original untouched
        assert_eq!(ts.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn with_values_rejects_length_change() {
        let ts = TimeSeries::new(vec![1.0, 2.0, 3.0], 1).unwrap();
        assert!(matches!(
            ts.with_values(vec![1.0, 2.0]),
            Err(AnalysisError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn require_min_len_reports_shortfall() {
        let ts = TimeSeries::new(vec![1.0; 10], 12).unwrap();
        assert!(ts.require_min_len(10).is_ok());
        assert!(matches!(
            ts.require_min_len(24),
            Err(AnalysisError::InsufficientData { needed: 24, got: 10 })
        ));
    }
}
