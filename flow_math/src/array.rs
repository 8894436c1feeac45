//! Shaped numeric collections with an explicit missing-value sentinel
//!
//! Every element is an `Option<f64>`; `None` marks a missing value and is
//! never confused with a legitimate `0.0`. A `NaN` that slips in through
//! deserialization is treated as missing by [`present`].

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// A scalar, vector, matrix or 3-D tensor of optional floats.
///
/// Serialized untagged, so JSON `null`, `1.5`, `[1, null]`, `[[1, 2]]` and
/// `[[[0]]]` all map onto the matching variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumArray {
    Scalar(Option<f64>),
    Vector(Vec<Option<f64>>),
    Matrix(Vec<Vec<Option<f64>>>),
    Tensor(Vec<Vec<Vec<Option<f64>>>>),
}

/// Returns the value if it is present and not `NaN`.
pub fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

impl NumArray {
    /// Convenience constructor for a vector without missing values
    pub fn from_values(values: &[f64]) -> Self {
        NumArray::Vector(values.iter().copied().map(Some).collect())
    }

    /// Number of dimensions (0 for a scalar)
    pub fn rank(&self) -> usize {
        match self {
            NumArray::Scalar(_) => 0,
            NumArray::Vector(_) => 1,
            NumArray::Matrix(_) => 2,
            NumArray::Tensor(_) => 3,
        }
    }

    /// Dimension sizes, outermost first.
    ///
    /// Fails with [`MathError::RaggedArray`] when rows of the same level
    /// differ in length.
    pub fn shape(&self) -> Result<Vec<usize>> {
        match self {
            NumArray::Scalar(_) => Ok(Vec::new()),
            NumArray::Vector(v) => Ok(vec![v.len()]),
            NumArray::Matrix(m) => {
                let cols = uniform_len(m.iter().map(Vec::len), "matrix rows")?;
                Ok(vec![m.len(), cols])
            }
            NumArray::Tensor(t) => {
                let rows = uniform_len(t.iter().map(Vec::len), "tensor slices")?;
                let cols = uniform_len(
                    t.iter().flat_map(|slice| slice.iter().map(Vec::len)),
                    "tensor rows",
                )?;
                Ok(vec![t.len(), rows, cols])
            }
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            NumArray::Scalar(_) => 1,
            NumArray::Vector(v) => v.len(),
            NumArray::Matrix(m) => m.iter().map(Vec::len).sum(),
            NumArray::Tensor(t) => t.iter().flatten().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All elements in row-major order
    pub fn values(&self) -> Vec<Option<f64>> {
        match self {
            NumArray::Scalar(v) => vec![*v],
            NumArray::Vector(v) => v.clone(),
            NumArray::Matrix(m) => m.iter().flatten().copied().collect(),
            NumArray::Tensor(t) => t.iter().flatten().flatten().copied().collect(),
        }
    }

    /// Apply `f` to every element, keeping the structure
    pub fn map<F>(&self, mut f: F) -> NumArray
    where
        F: FnMut(Option<f64>) -> Option<f64>,
    {
        match self {
            NumArray::Scalar(v) => NumArray::Scalar(f(*v)),
            NumArray::Vector(v) => NumArray::Vector(v.iter().map(|x| f(*x)).collect()),
            NumArray::Matrix(m) => NumArray::Matrix(
                m.iter()
                    .map(|row| row.iter().map(|x| f(*x)).collect())
                    .collect(),
            ),
            NumArray::Tensor(t) => NumArray::Tensor(
                t.iter()
                    .map(|slice| {
                        slice
                            .iter()
                            .map(|row| row.iter().map(|x| f(*x)).collect())
                            .collect()
                    })
                    .collect(),
            ),
        }
    }

    /// Combine two arrays element by element.
    ///
    /// Both operands must have the same rank and the same dimension sizes.
    pub fn zip_with<F>(&self, other: &NumArray, mut f: F) -> Result<NumArray>
    where
        F: FnMut(Option<f64>, Option<f64>) -> Option<f64>,
    {
        self.ensure_same_shape(other)?;
        let mut rhs = other.values().into_iter();
        Ok(self.map(|lhs| f(lhs, rhs.next().flatten())))
    }

    /// Fails with [`MathError::ShapeMismatch`] unless both arrays agree in shape
    pub fn ensure_same_shape(&self, other: &NumArray) -> Result<()> {
        let left = self.shape()?;
        let right = other.shape()?;
        if self.rank() != other.rank() || left != right {
            return Err(MathError::ShapeMismatch { left, right });
        }
        Ok(())
    }

    /// Split along the outermost (time) dimension.
    ///
    /// Scalars have no time dimension and are rejected.
    pub fn time_slices(&self) -> Result<Vec<NumArray>> {
        match self {
            NumArray::Scalar(_) => Err(MathError::InvalidInput(
                "a scalar has no time dimension".to_string(),
            )),
            NumArray::Vector(v) => Ok(v.iter().map(|x| NumArray::Scalar(*x)).collect()),
            NumArray::Matrix(m) => Ok(m.iter().cloned().map(NumArray::Vector).collect()),
            NumArray::Tensor(t) => Ok(t.iter().cloned().map(NumArray::Matrix).collect()),
        }
    }

    /// Inverse of [`NumArray::time_slices`]: stack slices of equal shape
    /// along a new outermost dimension.
    pub fn stack(slices: Vec<NumArray>) -> Result<NumArray> {
        let Some(first) = slices.first() else {
            return Err(MathError::InvalidInput(
                "cannot stack zero slices".to_string(),
            ));
        };
        for slice in &slices[1..] {
            first.ensure_same_shape(slice)?;
        }

        let mut scalars = Vec::new();
        let mut vectors = Vec::new();
        let mut matrices = Vec::new();
        for slice in slices {
            match slice {
                NumArray::Scalar(v) => scalars.push(v),
                NumArray::Vector(v) => vectors.push(v),
                NumArray::Matrix(m) => matrices.push(m),
                NumArray::Tensor(_) => {
                    return Err(MathError::InvalidInput(
                        "stacking 3-D slices would exceed three dimensions".to_string(),
                    ))
                }
            }
        }

        Ok(match first_rank(&scalars, &vectors) {
            0 => NumArray::Vector(scalars),
            1 => NumArray::Matrix(vectors),
            _ => NumArray::Tensor(matrices),
        })
    }
}

fn first_rank(scalars: &[Option<f64>], vectors: &[Vec<Option<f64>>]) -> usize {
    if !scalars.is_empty() {
        0
    } else if !vectors.is_empty() {
        1
    } else {
        2
    }
}

fn uniform_len(mut lens: impl Iterator<Item = usize>, what: &str) -> Result<usize> {
    let Some(first) = lens.next() else {
        return Ok(0);
    };
    match lens.find(|len| *len != first) {
        Some(other) => Err(MathError::RaggedArray(format!(
            "{} have lengths {} and {}",
            what, first, other
        ))),
        None => Ok(first),
    }
}

impl From<f64> for NumArray {
    fn from(value: f64) -> Self {
        NumArray::Scalar(Some(value))
    }
}

impl From<Vec<Option<f64>>> for NumArray {
    fn from(values: Vec<Option<f64>>) -> Self {
        NumArray::Vector(values)
    }
}

impl From<Vec<Vec<Option<f64>>>> for NumArray {
    fn from(values: Vec<Vec<Option<f64>>>) -> Self {
        NumArray::Matrix(values)
    }
}

impl From<Vec<Vec<Vec<Option<f64>>>>> for NumArray {
    fn from(values: Vec<Vec<Vec<Option<f64>>>>) -> Self {
        NumArray::Tensor(values)
    }
}
