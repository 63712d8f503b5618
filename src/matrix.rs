//! Dense row-major matrix of `f64`, the value type every input and output uses

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::{FtpError, Result};

/// Dense row-major matrix with dimensions fixed at construction
///
/// Invariant: `rows * cols == data.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Unchecked wire shape, validated on the way into `Matrix`
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = FtpError;

    fn try_from(raw: RawMatrix) -> Result<Self> {
        Matrix::new(raw.rows, raw.cols, raw.data)
    }
}

/// Number of elements in a `rows x cols` matrix, or an allocation failure on overflow
fn element_count(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or(FtpError::AllocationFailure { elements: usize::MAX })
}

impl Matrix {
    /// Wrap an existing row-major buffer
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = element_count(rows, cols)?;
        if data.len() != expected {
            return Err(FtpError::dimension(
                "buffer length",
                format!(
                    "{rows}x{cols} matrix needs {expected} elements, got {}",
                    data.len()
                ),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Zero-filled matrix; reports `AllocationFailure` instead of aborting
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = element_count(rows, cols)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| FtpError::AllocationFailure { elements: len })?;
        data.resize(len, 0.0);
        Ok(Self { rows, cols, data })
    }

    /// Copy a row-major slice into a new matrix
    pub fn from_slice(rows: usize, cols: usize, values: &[f64]) -> Result<Self> {
        let expected = element_count(rows, cols)?;
        if values.len() != expected {
            return Err(FtpError::dimension(
                "buffer length",
                format!(
                    "{rows}x{cols} matrix needs {expected} elements, got {}",
                    values.len()
                ),
            ));
        }
        let mut data = Vec::new();
        data.try_reserve_exact(expected)
            .map_err(|_| FtpError::AllocationFailure { elements: expected })?;
        data.extend_from_slice(values);
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows; every row must have the same width
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(n * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(FtpError::dimension(
                    "ragged rows",
                    format!("row {i} has {} columns, expected {cols}", row.len()),
                ));
            }
            data.extend(row);
        }
        Ok(Self { rows: n, cols, data })
    }

    /// Single-column matrix (`n x 1`)
    pub fn column(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// One row as a slice
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Row-major backing storage
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Position of the first non-finite element, if any
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|v| !v.is_finite())
            .map(|idx| (idx / self.cols, idx % self.cols))
    }

    /// Copy row-major into `dst`, returning the element count written.
    ///
    /// `dst` is left untouched when it is shorter than the matrix.
    pub fn copy_into(&self, dst: &mut [f64]) -> Result<usize> {
        let needed = self.data.len();
        if dst.len() < needed {
            return Err(FtpError::BufferTooSmall {
                needed,
                got: dst.len(),
            });
        }
        dst[..needed].copy_from_slice(&self.data);
        Ok(needed)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        debug_assert!(row < self.rows && col < self.cols);
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        debug_assert!(row < self.rows && col < self.cols);
        &mut self.data[row * self.cols + col]
    }
}
