//! # Permutation Parameters and Generator Configuration
//!
//! Poseidon over the BN254 scalar field with the x^5 S-box. The width `t` is the
//! number of inputs plus one capacity element; round counts follow the reference
//! parameter table (8 full rounds, partial rounds depending on `t`).

use crate::error::{CodegenError, Result};
use crate::stack::StackLayout;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full rounds for every supported width
pub const FULL_ROUNDS: usize = 8;

/// Partial rounds indexed by `t - 2`
pub const PARTIAL_ROUNDS: [usize; 8] = [56, 57, 56, 60, 60, 63, 64, 63];

/// Smallest supported width (one input)
pub const MIN_WIDTH: usize = 2;

/// Largest supported width (eight inputs)
pub const MAX_WIDTH: usize = 9;

/// Permutation parameters for one width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoseidonParams {
    /// State width t = inputs + 1
    pub width: usize,
    /// Full rounds R_F (split evenly before and after the partial rounds)
    pub full_rounds: usize,
    /// Partial rounds R_P
    pub partial_rounds: usize,
}

impl PoseidonParams {
    /// Parameters for `n_inputs` field elements (1..=8)
    pub fn for_inputs(n_inputs: usize) -> Result<Self> {
        if n_inputs == 0 || n_inputs >= MAX_WIDTH {
            return Err(CodegenError::UnsupportedWidth { inputs: n_inputs });
        }
        Self::for_width(n_inputs + 1)
    }

    /// Parameters for state width `width` (2..=9)
    pub fn for_width(width: usize) -> Result<Self> {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            return Err(CodegenError::UnsupportedWidth {
                inputs: width.saturating_sub(1),
            });
        }
        Ok(Self {
            width,
            full_rounds: FULL_ROUNDS,
            partial_rounds: PARTIAL_ROUNDS[width - MIN_WIDTH],
        })
    }

    /// Every supported parameter set, narrowest first
    pub fn all() -> impl Iterator<Item = Self> {
        (MIN_WIDTH..=MAX_WIDTH).map(|width| Self {
            width,
            full_rounds: FULL_ROUNDS,
            partial_rounds: PARTIAL_ROUNDS[width - MIN_WIDTH],
        })
    }

    pub fn n_inputs(&self) -> usize {
        self.width - 1
    }

    /// R_f = R_F / 2, full rounds on each side of the partial phase
    pub fn half_full_rounds(&self) -> usize {
        self.full_rounds / 2
    }

    pub fn total_rounds(&self) -> usize {
        self.full_rounds + self.partial_rounds
    }

    /// Length of the reference round-constant sequence, (R_F + R_P) * t
    pub fn reference_constant_count(&self) -> usize {
        self.total_rounds() * self.width
    }

    /// Length of the compacted round-constant sequence, R_F * t + R_P
    pub fn optimized_constant_count(&self) -> usize {
        self.full_rounds * self.width + self.partial_rounds
    }
}

impl fmt::Display for PoseidonParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={} R_F={} R_P={}",
            self.width, self.full_rounds, self.partial_rounds
        )
    }
}

/// How the dense linear layer keeps the old state while accumulating new rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MixStrategy {
    /// Stack-resident when it fits the DUP/SWAP reach, memory-spilled otherwise
    #[default]
    Auto,
    /// Old state stays on the stack; new rows accumulate above it
    StackResident,
    /// Old state is stored to scratch memory first
    MemorySpilled,
}

impl MixStrategy {
    /// Concrete strategy for `width`
    pub fn resolve(self, width: usize) -> Result<Self> {
        let fits = StackLayout::new(width).stack_resident_mix_fits();
        match self {
            MixStrategy::Auto if fits => Ok(MixStrategy::StackResident),
            MixStrategy::Auto => Ok(MixStrategy::MemorySpilled),
            MixStrategy::StackResident if !fits => Err(CodegenError::StrategyUnavailable {
                strategy: self,
                width,
            }),
            other => Ok(other),
        }
    }
}

/// Code generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Entry-point name used for the selectors and the interface descriptor
    pub function_name: String,

    /// Dense-mix strategy
    pub mix_strategy: MixStrategy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            function_name: "poseidon".to_string(),
            mix_strategy: MixStrategy::Auto,
        }
    }
}
