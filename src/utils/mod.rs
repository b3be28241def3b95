//! Shared numerical utilities.

pub(crate) mod linalg;
pub mod stats;

pub use stats::{mean, mean_ignoring_nan, std_dev, variance};
