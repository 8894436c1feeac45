//! Relative growth between a base and a comparison value
//!
//! Only the safe convention is supported: a zero base yields a missing
//! result instead of an infinity or an error.

use crate::array::{present, NumArray};
use crate::Result;

/// Growth of `b` relative to `a`: `(b - a) / |a|`.
///
/// Returns `None` when either operand is missing or `a == 0`.
pub fn growth_rate(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    let (a, b) = (present(a)?, present(b)?);
    if a == 0.0 {
        return None;
    }
    Some((b - a) / a.abs())
}

/// Element-wise [`growth_rate`] over two arrays of identical shape
pub fn growth(a: &NumArray, b: &NumArray) -> Result<NumArray> {
    a.zip_with(b, growth_rate)
}
