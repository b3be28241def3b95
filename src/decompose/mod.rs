//! Seasonal decomposition and variance-stabilizing transforms.

mod classical;
mod transform;

pub use classical::{classical_decomposition, Decomposition, DecompositionMode};
pub use transform::{boxcox, guerrero_lambda, inv_boxcox};
