//! Sparse partial-round matrices
//!
//! A partial-round linear layer has the shape
//!
//! ```text
//! | m00  v1 .. v_{t-1} |
//! | w1    1          0 |
//! | ..       ..        |
//! | w_{t-1}  0       1 |
//! ```
//!
//! stored compactly as `[m00, v1 .. v_{t-1}, w1 .. w_{t-1}]` (2t - 1 entries). Applying
//! it costs one inner product plus t - 1 scaled additions instead of t^2 products.

use crate::error::{CodegenError, Result};
use crate::matrix::Matrix;
use poseidon_evm_spec::Fr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseMatrix {
    entries: Vec<Fr>,
}

impl SparseMatrix {
    /// Wrap `2t - 1` entries; `None` for an even or empty length
    pub fn new(entries: Vec<Fr>) -> Option<Self> {
        if entries.len() % 2 == 0 {
            return None;
        }
        Some(Self { entries })
    }

    /// State width t
    pub fn width(&self) -> usize {
        (self.entries.len() + 1) / 2
    }

    pub fn entries(&self) -> &[Fr] {
        &self.entries
    }

    /// Row-0 coefficient for state element `j` (m00 for j = 0)
    pub fn row0(&self, j: usize) -> &Fr {
        &self.entries[j]
    }

    /// Column-0 coefficient for state element `k >= 1`
    pub fn col0(&self, k: usize) -> &Fr {
        &self.entries[self.width() + k - 1]
    }

    /// In-place update: `x0' = <row0, x>`, `x_k' = x_k + w_k * x0`
    pub fn apply(&self, state: &mut [Fr]) -> Result<()> {
        let t = self.width();
        if state.len() != t {
            return Err(CodegenError::StateLength {
                expected: t,
                actual: state.len(),
            });
        }
        let x0 = state[0].clone();
        let s0 = (0..t).fold(Fr::zero(), |acc, j| acc + self.row0(j) * &state[j]);
        for k in 1..t {
            state[k] = &state[k] + &(&x0 * self.col0(k));
        }
        state[0] = s0;
        Ok(())
    }

    /// Equivalent dense matrix
    pub fn to_dense(&self) -> Matrix {
        Matrix::from_fn(self.width(), |i, j| match (i, j) {
            (0, j) => self.row0(j).clone(),
            (i, 0) => self.col0(i).clone(),
            (i, j) if i == j => Fr::one(),
            _ => Fr::zero(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fr(x: u64) -> Fr {
        Fr::from_u64(x)
    }

    #[test]
    fn test_rejects_even_length() {
        assert!(SparseMatrix::new(vec![]).is_none());
        assert!(SparseMatrix::new(vec![fr(1), fr(2)]).is_none());
    }

    #[test]
    fn test_layout() {
        // t = 3: [m00, v1, v2, w1, w2]
        let s = SparseMatrix::new((1..=5).map(fr).collect()).unwrap();
        assert_eq!(s.width(), 3);
        assert_eq!(s.row0(0), &fr(1));
        assert_eq!(s.row0(2), &fr(3));
        assert_eq!(s.col0(1), &fr(4));
        assert_eq!(s.col0(2), &fr(5));
    }

    #[test]
    fn test_apply_small() {
        let s = SparseMatrix::new((1..=5).map(fr).collect()).unwrap();
        let mut state = vec![fr(10), fr(20), fr(30)];
        s.apply(&mut state).unwrap();
        // x0' = 1*10 + 2*20 + 3*30, x1' = 20 + 4*10, x2' = 30 + 5*10
        assert_eq!(state, vec![fr(140), fr(60), fr(80)]);
    }

    #[test]
    fn test_apply_rejects_wrong_state_length() {
        let s = SparseMatrix::new((1..=5).map(fr).collect()).unwrap();
        let mut short = vec![fr(10), fr(20)];
        assert!(matches!(
            s.apply(&mut short),
            Err(CodegenError::StateLength {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(short, vec![fr(10), fr(20)]);

        let mut long = vec![fr(1); 4];
        assert!(s.apply(&mut long).is_err());
    }

    #[test]
    fn test_to_dense_width_one() {
        let s = SparseMatrix::new(vec![fr(7)]).unwrap();
        assert_eq!(s.to_dense().rows(), &[vec![fr(7)]]);
    }

    #[test]
    fn test_to_dense_small() {
        let s = SparseMatrix::new((1..=5).map(fr).collect()).unwrap();
        let dense = s.to_dense();
        assert_eq!(dense.row(0), &[fr(1), fr(2), fr(3)]);
        assert_eq!(dense.row(1), &[fr(4), fr(1), fr(0)]);
        assert_eq!(dense.row(2), &[fr(5), fr(0), fr(1)]);
    }

    fn arb_fr() -> impl Strategy<Value = Fr> {
        any::<[u8; 32]>().prop_map(|b| Fr::from_bytes_be(&b))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_apply_matches_dense(
            t in 2usize..=9,
            entries in proptest::collection::vec(arb_fr(), 17),
            state in proptest::collection::vec(arb_fr(), 9),
        ) {
            let s = SparseMatrix::new(entries[..2 * t - 1].to_vec()).unwrap();
            let mut sparse_state = state[..t].to_vec();
            s.apply(&mut sparse_state).unwrap();
            prop_assert_eq!(sparse_state, s.to_dense().mul_vec(&state[..t]));
        }
    }
}
