//! Structural breakpoint detection.
//!
//! Finds points where the level (or the linear trend) of a series
//! changes regime. Detection is exact over all segmentations up to a
//! breakpoint cap, with the number of breakpoints chosen by BIC.
//!
//! # Example
//!
//! ```
//! use tsanalysis::changepoint::{detect_breakpoints, BreakpointConfig};
//!
//! let mut series = vec![0.0; 50];
//! series.extend(vec![10.0; 50]);
//!
//! let result = detect_breakpoints(&series, &BreakpointConfig::default()).unwrap();
//! assert_eq!(result.breakpoints.len(), 1);
//! assert_eq!(result.breakpoints[0].index, 50);
//! ```

mod cost;
mod segment;

pub use cost::CostModel;
pub use segment::{
    detect_breakpoints, detect_breakpoints_labeled, Breakpoint, BreakpointConfig, Breakpoints,
};
