//! Dense matrices over the BN254 scalar field

use poseidon_evm_spec::Fr;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Row-major dense matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    rows: Vec<Vec<Fr>>,
}

impl Matrix {
    /// Build from rows; returns `None` if the rows are ragged or empty
    pub fn from_rows(rows: Vec<Vec<Fr>>) -> Option<Self> {
        let cols = rows.first()?.len();
        if cols == 0 || rows.iter().any(|row| row.len() != cols) {
            return None;
        }
        Some(Self { rows })
    }

    /// `n x n` matrix with entry `(i, j) = f(i, j)`
    pub fn from_fn(n: usize, f: impl Fn(usize, usize) -> Fr) -> Self {
        let rows = (0..n).map(|i| (0..n).map(|j| f(i, j)).collect()).collect();
        Self { rows }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, |i, j| if i == j { Fr::one() } else { Fr::zero() })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.rows[0].len()
    }

    pub fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }

    pub fn rows(&self) -> &[Vec<Fr>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &[Fr] {
        &self.rows[i]
    }

    /// Matrix product `self * other`
    pub fn mul(&self, other: &Matrix) -> Matrix {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                (0..other.num_cols())
                    .map(|j| {
                        row.iter()
                            .zip(other.rows.iter())
                            .fold(Fr::zero(), |acc, (a, brow)| acc + a * &brow[j])
                    })
                    .collect()
            })
            .collect();
        Matrix { rows }
    }

    /// Matrix-vector product `self * v` (column-vector convention)
    pub fn mul_vec(&self, v: &[Fr]) -> Vec<Fr> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(v)
                    .fold(Fr::zero(), |acc, (a, x)| acc + a * x)
            })
            .collect()
    }

    /// Lower-right block with the first row and column removed
    pub fn minor(&self) -> Matrix {
        let rows = self.rows[1..].iter().map(|row| row[1..].to_vec()).collect();
        Matrix { rows }
    }

    /// Inverse by Gauss-Jordan elimination; `None` if singular or not square
    pub fn inverse(&self) -> Option<Matrix> {
        if !self.is_square() {
            return None;
        }
        let n = self.num_rows();
        let mut a = self.rows.clone();
        let mut inv = Matrix::identity(n).rows;

        for col in 0..n {
            let pivot = (col..n).find(|&r| !a[r][col].is_zero())?;
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let scale = a[col][col].inverse()?;
            for x in a[col].iter_mut() {
                *x = &*x * &scale;
            }
            for x in inv[col].iter_mut() {
                *x = &*x * &scale;
            }

            for r in 0..n {
                if r == col || a[r][col].is_zero() {
                    continue;
                }
                let factor = a[r][col].clone();
                for c in 0..n {
                    let da = &factor * &a[col][c];
                    a[r][c] = &a[r][c] - &da;
                    let di = &factor * &inv[col][c];
                    inv[r][c] = &inv[r][c] - &di;
                }
            }
        }

        Some(Matrix { rows: inv })
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Fr;

    fn index(&self, (i, j): (usize, usize)) -> &Fr {
        &self.rows[i][j]
    }
}
