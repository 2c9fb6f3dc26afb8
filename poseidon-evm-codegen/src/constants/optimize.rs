//! Derivation of the optimized tables
//!
//! Notation: `c_r` are the reference round constants of round r, `M` the MDS matrix,
//! `R_f = R_F / 2`.
//!
//! Constants. Adding `c_{r+1}` after `M` equals adding `M^-1 c_{r+1}` before it, so every
//! constant after the first round is pulled in front of the preceding linear layer and
//! lands right after the S-box. Inside the partial phase only element 0 passes through
//! the S-box, so only component 0 has to stay in its round (`b_j`); the remaining
//! components keep travelling backwards and finally fold into the transitional round.
//!
//! Matrices. Walking the partial rounds backwards, the current matrix is split as
//! `cur = S_j * B_j` with `B_j = diag(1, cur_hat)` and `S_j` sparse. `B_j` commutes
//! with a first-element-only S-box, so it merges into the previous round's matrix:
//! `cur <- B_j * M`. What remains after the first partial round is the transitional
//! matrix.

use crate::constants::{OptimizedConstants, ReferenceConstants};
use crate::error::{CodegenError, Result};
use crate::matrix::Matrix;
use crate::params::PoseidonParams;
use crate::sparse::SparseMatrix;
use poseidon_evm_spec::Fr;
use tracing::debug;

fn singular(what: &str) -> CodegenError {
    CodegenError::InvalidConstants(format!("{} is singular", what))
}

/// Compact round constants: `a_0 .. a_{R_f}`, `b_0 .. b_{R_P-1}`, `d_0 .. d_{R_f-2}`
fn compress_round_constants(
    params: &PoseidonParams,
    reference: &ReferenceConstants,
    mds_inv: &Matrix,
) -> Vec<Fr> {
    let rf = params.half_full_rounds();
    let rp = params.partial_rounds;
    let c = |r: usize| reference.round(params, r);

    let mut out = Vec::with_capacity(params.optimized_constant_count());

    // a_0 .. a_{R_f - 1}
    out.extend_from_slice(c(0));
    for r in 1..rf {
        out.extend(mds_inv.mul_vec(c(r)));
    }

    // Walk the partial rounds backwards, starting from the first second-half round
    let mut acc = c(rf + rp).to_vec();
    let mut partial = vec![Fr::zero(); rp];
    for j in (0..rp).rev() {
        let moved = mds_inv.mul_vec(&acc);
        partial[j] = moved[0].clone();
        acc = c(rf + j).to_vec();
        for k in 1..params.width {
            acc[k] = &acc[k] + &moved[k];
        }
    }

    // a_{R_f}: transitional round
    out.extend(mds_inv.mul_vec(&acc));
    out.extend(partial);

    // d_0 .. d_{R_f - 2}
    for r in 0..rf - 1 {
        out.extend(mds_inv.mul_vec(c(rf + rp + r + 1)));
    }

    out
}

/// Sparse factors of every partial round plus the transitional matrix
fn factor_partial_matrices(
    params: &PoseidonParams,
    mds: &Matrix,
) -> Result<(Matrix, Vec<SparseMatrix>)> {
    let t = params.width;
    let mut cur = mds.clone();
    let mut sparse = vec![None; params.partial_rounds];

    for j in (0..params.partial_rounds).rev() {
        let hat = cur.minor();
        let hat_inv = hat.inverse().ok_or_else(|| singular("partial-round minor"))?;
        let v = &cur.row(0)[1..];

        // v_hat = v * hat^-1 (row vector)
        let v_hat = (0..t - 1).map(|k| {
            v.iter()
                .enumerate()
                .fold(Fr::zero(), |acc, (l, vl)| acc + vl * &hat_inv[(l, k)])
        });
        let w = (1..t).map(|i| cur[(i, 0)].clone());

        let entries: Vec<Fr> = std::iter::once(cur[(0, 0)].clone())
            .chain(v_hat)
            .chain(w)
            .collect();
        sparse[j] = SparseMatrix::new(entries);

        // B = diag(1, hat)
        let rows = (0..t)
            .map(|i| {
                (0..t)
                    .map(|k| match (i, k) {
                        (0, 0) => Fr::one(),
                        (0, _) | (_, 0) => Fr::zero(),
                        (i, k) => hat[(i - 1, k - 1)].clone(),
                    })
                    .collect()
            })
            .collect();
        let b = Matrix::from_rows(rows).ok_or_else(|| singular("block matrix"))?;
        cur = b.mul(mds);
    }

    let sparse = sparse
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| CodegenError::InvalidConstants("malformed sparse matrix".to_string()))?;
    Ok((cur, sparse))
}

/// Optimized tables equivalent to `reference`
pub fn derive(params: &PoseidonParams, reference: &ReferenceConstants) -> Result<OptimizedConstants> {
    reference.validate(params)?;
    let mds_inv = reference.mds.inverse().ok_or_else(|| singular("mds"))?;

    let round_constants = compress_round_constants(params, reference, &mds_inv);
    let (transition, sparse) = factor_partial_matrices(params, &reference.mds)?;

    debug!(
        width = params.width,
        constants = round_constants.len(),
        sparse = sparse.len(),
        "derived optimized constants"
    );

    let optimized = OptimizedConstants {
        round_constants,
        mds: reference.mds.clone(),
        transition,
        sparse,
    };
    optimized.validate(params)?;
    Ok(optimized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        for params in PoseidonParams::all().take(3) {
            let reference = ReferenceConstants::generate(&params);
            let optimized = derive(&params, &reference).unwrap();
            assert_eq!(
                optimized.round_constants.len(),
                params.full_rounds * params.width + params.partial_rounds
            );
            assert_eq!(optimized.sparse.len(), params.partial_rounds);
            assert_eq!(optimized.mds, reference.mds);
        }
    }

    #[test]
    fn test_first_block_unchanged() {
        let params = PoseidonParams::for_width(3).unwrap();
        let reference = ReferenceConstants::generate(&params);
        let optimized = derive(&params, &reference).unwrap();
        assert_eq!(optimized.first_half(&params, 0), reference.round(&params, 0));
    }

    #[test]
    fn test_last_partial_round_factorization() {
        // The last partial round factors the plain MDS matrix: M = S * diag(1, M_hat)
        let params = PoseidonParams::for_width(4).unwrap();
        let reference = ReferenceConstants::generate(&params);
        let optimized = derive(&params, &reference).unwrap();

        let t = params.width;
        let hat = reference.mds.minor();
        let rows = (0..t)
            .map(|i| {
                (0..t)
                    .map(|k| {
                        if i == 0 && k == 0 {
                            Fr::one()
                        } else if i == 0 || k == 0 {
                            Fr::zero()
                        } else {
                            hat[(i - 1, k - 1)].clone()
                        }
                    })
                    .collect()
            })
            .collect();
        let b = Matrix::from_rows(rows).unwrap();

        let last = optimized.sparse.last().unwrap();
        assert_eq!(last.to_dense().mul(&b), reference.mds);
    }

    #[test]
    fn test_each_factor_reproduces_round_matrix() {
        // cur_j = S_j * diag(1, cur_j_hat) for every partial round, walking backwards from M
        let params = PoseidonParams::for_width(3).unwrap();
        let reference = ReferenceConstants::generate(&params);
        let optimized = derive(&params, &reference).unwrap();
        let t = params.width;

        let block = |m: &Matrix| {
            let hat = m.minor();
            let rows = (0..t)
                .map(|i| {
                    (0..t)
                        .map(|k| match (i, k) {
                            (0, 0) => Fr::one(),
                            (0, _) | (_, 0) => Fr::zero(),
                            (i, k) => hat[(i - 1, k - 1)].clone(),
                        })
                        .collect()
                })
                .collect();
            Matrix::from_rows(rows).unwrap()
        };

        let mut cur = reference.mds.clone();
        for j in (0..params.partial_rounds).rev() {
            let b = block(&cur);
            assert_eq!(optimized.sparse[j].to_dense().mul(&b), cur, "round {}", j);
            cur = b.mul(&reference.mds);
        }
        assert_eq!(cur, optimized.transition);
    }

    #[test]
    fn test_singular_mds_rejected() {
        let params = PoseidonParams::for_width(2).unwrap();
        let mut reference = ReferenceConstants::generate(&params);
        reference.mds = Matrix::from_rows(vec![
            vec![Fr::one(), Fr::one()],
            vec![Fr::one(), Fr::one()],
        ])
        .unwrap();
        assert!(matches!(
            derive(&params, &reference),
            Err(CodegenError::InvalidConstants(_))
        ));
    }
}
