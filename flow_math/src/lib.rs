//! # Flow Math
//!
//! Numeric kernels for origin/destination flow analysis.
//! Every kernel works on [`NumArray`] values, which may be scalars, vectors,
//! matrices or 3-D tensors and carry an explicit missing-value sentinel.
//!
//! - Safe-mode growth rates
//! - RMSE / MAE / MAPE over valid element pairs
//! - Baseline forecasters (naive, moving average, noisy replay)

use thiserror::Error;

pub mod array;
pub mod forecasting;
pub mod growth;
pub mod metrics;

pub use array::NumArray;
pub use forecasting::{forecast, ForecastMethod, Forecaster, MovingAverage, Naive, NoisyReplay};
pub use growth::{growth, growth_rate};
pub use metrics::{metrics, MetricsResult};

/// Errors that can occur in flow math operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Shape mismatch: left operand has shape {left:?}, right operand has shape {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("Ragged array: {0}")]
    RaggedArray(String),

    #[error("Empty history: forecasting needs at least one time step")]
    EmptyHistory,

    #[error("Invalid horizon: {0} (must be greater than zero)")]
    InvalidHorizon(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for flow math operations
pub type Result<T> = std::result::Result<T, MathError>;
