//! Core data structures for time series analysis.

mod time_series;

pub use time_series::TimeSeries;
