//! Error metrics for comparing a prediction against observed values
//!
//! A pair only counts when neither side is missing. MAPE additionally skips
//! pairs whose observed value is zero rather than treating them as an
//! infinite error.

use crate::array::{present, NumArray};
use crate::Result;
use serde::{Deserialize, Serialize};

/// RMSE, MAE and MAPE of a prediction; `None` when no pair qualified
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// Root Mean Squared Error
    pub rmse: Option<f64>,
    /// Mean Absolute Error
    pub mae: Option<f64>,
    /// Mean Absolute Percentage Error, as a fraction (0.125 = 12.5%)
    pub mape: Option<f64>,
}

impl std::fmt::Display for MetricsResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn show(value: Option<f64>) -> String {
            value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
        }
        writeln!(f, "Prediction Metrics:")?;
        writeln!(f, "  RMSE:  {}", show(self.rmse))?;
        writeln!(f, "  MAE:   {}", show(self.mae))?;
        writeln!(f, "  MAPE:  {}", show(self.mape))?;
        Ok(())
    }
}

/// Compute RMSE, MAE and MAPE between two arrays of identical shape
pub fn metrics(y_true: &NumArray, y_pred: &NumArray) -> Result<MetricsResult> {
    y_true.ensure_same_shape(y_pred)?;
    let actual = y_true.values();
    let predicted = y_pred.values();

    Ok(MetricsResult {
        rmse: root_mean_squared_error(&actual, &predicted),
        mae: mean_absolute_error(&actual, &predicted),
        mape: mean_absolute_percentage_error(&actual, &predicted),
    })
}

fn valid_pairs<'a>(
    actual: &'a [Option<f64>],
    predicted: &'a [Option<f64>],
) -> impl Iterator<Item = (f64, f64)> + 'a {
    actual
        .iter()
        .zip(predicted.iter())
        .filter_map(|(a, p)| Some((present(*a)?, present(*p)?)))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Mean Absolute Error over valid pairs of two flat sequences
pub fn mean_absolute_error(actual: &[Option<f64>], predicted: &[Option<f64>]) -> Option<f64> {
    mean(valid_pairs(actual, predicted).map(|(a, p)| (p - a).abs()))
}

/// Mean Squared Error over valid pairs of two flat sequences
pub fn mean_squared_error(actual: &[Option<f64>], predicted: &[Option<f64>]) -> Option<f64> {
    mean(valid_pairs(actual, predicted).map(|(a, p)| (p - a).powi(2)))
}

/// Root Mean Squared Error over valid pairs of two flat sequences
pub fn root_mean_squared_error(
    actual: &[Option<f64>],
    predicted: &[Option<f64>],
) -> Option<f64> {
    mean_squared_error(actual, predicted).map(f64::sqrt)
}

/// Mean Absolute Percentage Error over valid pairs whose actual value is non-zero
pub fn mean_absolute_percentage_error(
    actual: &[Option<f64>],
    predicted: &[Option<f64>],
) -> Option<f64> {
    mean(
        valid_pairs(actual, predicted)
            .filter(|(a, _)| *a != 0.0)
            .map(|(a, p)| ((p - a) / a).abs()),
    )
}
