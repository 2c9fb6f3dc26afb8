//! # Constant Tables
//!
//! Two views of the same permutation:
//!
//! - [`ReferenceConstants`]: the textbook tables, `(R_F + R_P) * t` round constants and
//!   the t x t MDS matrix.
//! - [`OptimizedConstants`]: what the generated bytecode consumes. Round constants are
//!   moved through the linear layers so partial rounds only add to element 0, and the
//!   partial-round matrices are factored into one transitional dense matrix plus one
//!   sparse matrix per partial round.
//!
//! Both are produced deterministically from the permutation parameters, or can be
//! supplied externally and checked with `validate`.

pub mod grain;
pub mod optimize;

use crate::error::{CodegenError, Result};
use crate::matrix::Matrix;
use crate::params::PoseidonParams;
use crate::sparse::SparseMatrix;
use poseidon_evm_spec::Fr;
use serde::{Deserialize, Serialize};

pub use grain::GrainLfsr;

fn check_mds(params: &PoseidonParams, name: &str, m: &Matrix) -> Result<()> {
    let t = params.width;
    if m.num_rows() != t || m.num_cols() != t {
        return Err(CodegenError::InvalidConstants(format!(
            "{} is {}x{}, expected {}x{}",
            name,
            m.num_rows(),
            m.num_cols(),
            t,
            t
        )));
    }
    Ok(())
}

/// Textbook round constants and MDS matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceConstants {
    pub round_constants: Vec<Fr>,
    pub mds: Matrix,
}

impl ReferenceConstants {
    /// Tables from the Grain LFSR generator
    pub fn generate(params: &PoseidonParams) -> Self {
        let (round_constants, mds) = grain::generate(params);
        Self {
            round_constants,
            mds,
        }
    }

    pub fn validate(&self, params: &PoseidonParams) -> Result<()> {
        let expected = params.reference_constant_count();
        if self.round_constants.len() != expected {
            return Err(CodegenError::InvalidConstants(format!(
                "{} round constants, expected {}",
                self.round_constants.len(),
                expected
            )));
        }
        check_mds(params, "mds", &self.mds)
    }

    /// Constants added at the start of `round`
    pub fn round(&self, params: &PoseidonParams, round: usize) -> &[Fr] {
        let t = params.width;
        &self.round_constants[round * t..(round + 1) * t]
    }
}

/// Tables for the optimized schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedConstants {
    /// `R_F * t + R_P` compacted constants, see [`OptimizedConstants::first_half`] and friends
    pub round_constants: Vec<Fr>,
    /// Dense matrix of the full rounds
    pub mds: Matrix,
    /// Dense matrix of the transitional round before the partial phase
    pub transition: Matrix,
    /// One sparse matrix per partial round
    pub sparse: Vec<SparseMatrix>,
}

impl OptimizedConstants {
    /// Derive from the Grain reference tables
    pub fn generate(params: &PoseidonParams) -> Result<Self> {
        optimize::derive(params, &ReferenceConstants::generate(params))
    }

    pub fn validate(&self, params: &PoseidonParams) -> Result<()> {
        let expected = params.optimized_constant_count();
        if self.round_constants.len() != expected {
            return Err(CodegenError::InvalidConstants(format!(
                "{} optimized round constants, expected {}",
                self.round_constants.len(),
                expected
            )));
        }
        check_mds(params, "mds", &self.mds)?;
        check_mds(params, "transition matrix", &self.transition)?;
        if self.sparse.len() != params.partial_rounds {
            return Err(CodegenError::InvalidConstants(format!(
                "{} sparse matrices, expected {}",
                self.sparse.len(),
                params.partial_rounds
            )));
        }
        if let Some(bad) = self.sparse.iter().find(|s| s.width() != params.width) {
            return Err(CodegenError::InvalidConstants(format!(
                "sparse matrix of width {}, expected {}",
                bad.width(),
                params.width
            )));
        }
        Ok(())
    }

    /// Constants of the first half: `R_f + 1` blocks of t
    ///
    /// Block 0 is added before the first S-box, block `r` (1..R_f) after the S-box of
    /// round `r - 1`, and block `R_f` after the S-box of the transitional round.
    pub fn first_half(&self, params: &PoseidonParams, block: usize) -> &[Fr] {
        let t = params.width;
        &self.round_constants[block * t..(block + 1) * t]
    }

    /// Scalar added to element 0 after the S-box of partial round `round`
    pub fn partial(&self, params: &PoseidonParams, round: usize) -> &Fr {
        let base = (params.half_full_rounds() + 1) * params.width;
        &self.round_constants[base + round]
    }

    /// Constants added after the S-box of second-half full round `round` (0..R_f-1)
    pub fn second_half(&self, params: &PoseidonParams, round: usize) -> &[Fr] {
        let t = params.width;
        let base = (params.half_full_rounds() + 1) * t + params.partial_rounds;
        &self.round_constants[base + round * t..base + (round + 1) * t]
    }
}
