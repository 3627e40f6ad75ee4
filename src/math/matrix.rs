use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f32::consts::PI;
use std::ops::{Add, Sub, Mul};

use crate::error::{NnError, Result};

/// Dense row-major single-precision matrix.
///
/// Weights are stored `(n_input, n_output)` so a forward step is the row
/// vector product `x · W`; biases are `(1, n_output)` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f32>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Builds a matrix from nested rows. Every row must have the same,
    /// non-zero length.
    pub fn from_data(data: Vec<Vec<f32>>) -> Result<Matrix> {
        let cols = data.first().map(|row| row.len()).unwrap_or(0);
        if data.is_empty() || cols == 0 {
            return Err(NnError::ShapeMismatch("matrix must have at least one row and one column".into()));
        }
        if let Some(i) = data.iter().position(|row| row.len() != cols) {
            return Err(NnError::ShapeMismatch(format!(
                "row {i} has {} columns, expected {cols}", data[i].len()
            )));
        }
        Ok(Matrix { rows: data.len(), cols, data })
    }

    /// A single row vector `(1, n)`.
    pub fn from_vec(row: Vec<f32>) -> Matrix {
        Matrix { rows: 1, cols: row.len(), data: vec![row] }
    }

    /// Reshapes a flat row-major buffer into `(rows, cols)`.
    pub fn from_flat(rows: usize, cols: usize, flat: &[f32]) -> Result<Matrix> {
        let len = rows.checked_mul(cols).ok_or_else(|| {
            NnError::ShapeMismatch(format!("a {rows}x{cols} matrix is too large"))
        })?;
        if flat.len() != len {
            return Err(NnError::ShapeMismatch(format!(
                "{} values cannot fill a {rows}x{cols} matrix", flat.len()
            )));
        }
        let data = if cols == 0 {
            vec![Vec::new(); rows]
        } else {
            flat.chunks(cols).map(|chunk| chunk.to_vec()).collect()
        };
        Ok(Matrix { rows, cols, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Checks that `data` really holds `rows` rows of `cols` values. The
    /// fields are public, so a hand-built matrix can disagree with itself.
    pub fn check_consistent(&self) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(NnError::ShapeMismatch(format!(
                "matrix claims {} rows but holds {}", self.rows, self.data.len()
            )));
        }
        if let Some(i) = self.data.iter().position(|row| row.len() != self.cols) {
            return Err(NnError::ShapeMismatch(format!(
                "row {i} has {} columns, matrix claims {}", self.data[i].len(), self.cols
            )));
        }
        Ok(())
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i]
    }

    /// Row-major copy of every element.
    pub fn flatten(&self) -> Vec<f32> {
        self.data.iter().flat_map(|row| row.iter().copied()).collect()
    }

    /// Uniform U(-1, 1) scaled by `sqrt(6 / (rows + cols))`.
    pub fn xavier<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let scale = (6.0 / (rows + cols) as f32).sqrt();
        Matrix::filled_with(rows, cols, || (rng.gen::<f32>() * 2.0 - 1.0) * scale)
    }

    /// Kaiming (He) initialization: N(0, 1) scaled by `sqrt(2 / rows)`.
    ///
    /// `rows` is the fan-in of a `(n_input, n_output)` weight matrix.
    /// Recommended before ReLU layers.
    pub fn kaiming<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let scale = (2.0 / rows as f32).sqrt();
        Matrix::filled_with(rows, cols, || sample_standard_normal(rng) * scale)
    }

    /// Unscaled N(0, 1) values.
    pub fn normal<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        Matrix::filled_with(rows, cols, || sample_standard_normal(rng))
    }

    fn filled_with<F: FnMut() -> f32>(rows: usize, cols: usize, mut sample: F) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = sample();
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f32) -> f32,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Outer product `a ⊗ b`, shape `(a.len(), b.len())`.
    pub fn outer(a: &[f32], b: &[f32]) -> Matrix {
        Matrix {
            rows: a.len(),
            cols: b.len(),
            data: a.iter().map(|&x| b.iter().map(|&y| x * y).collect()).collect(),
        }
    }

    /// Matrix-vector product `self · v`, where `v.len() == self.cols`.
    pub fn dot_vec(&self, v: &[f32]) -> Vec<f32> {
        assert_eq!(self.cols, v.len(), "matrix-vector product with incorrect sizes");
        self.data.iter()
            .map(|row| row.iter().zip(v.iter()).map(|(w, x)| w * x).sum())
            .collect()
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // Both draws lie in (0, 1] to avoid log(0).
    let u1: f32 = 1.0 - rng.gen::<f32>();
    let u2: f32 = 1.0 - rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] + rhs.data[i][j];
            }
        }

        res
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] - rhs.data[i][j];
            }
        }

        res
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }

                res.data[i][j] = sum;
            }
        }

        res
    }
}
