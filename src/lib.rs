//! # tsanalysis
//!
//! Time series analysis toolkit: trend estimation (loess, quantile and
//! segmented regression), classical seasonal decomposition with
//! automatic variance stabilization, Shewhart control charts,
//! structural breakpoint detection, smoothed-periodogram spectral
//! analysis, circular statistics, and temporal parsing and
//! normalization helpers.

#![allow(clippy::needless_range_loop)]

pub mod changepoint;
pub mod circular;
pub mod control;
pub mod core;
pub mod decompose;
pub mod error;
pub mod spectral;
pub mod temporal;
pub mod trend;
pub mod utils;

pub use error::{AnalysisError, Result};

pub mod prelude {
    pub use crate::changepoint::{detect_breakpoints, BreakpointConfig, Breakpoints};
    pub use crate::control::{u_chart, ControlChart, UChartConfig};
    pub use crate::core::TimeSeries;
    pub use crate::decompose::{classical_decomposition, Decomposition, DecompositionMode};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::spectral::{periodogram, Spectrum, SpectrumConfig};
    pub use crate::trend::{fit_trend, loess, ols_line, segmented_fit, LoessConfig, TrendFit, TrendMethod};
}
