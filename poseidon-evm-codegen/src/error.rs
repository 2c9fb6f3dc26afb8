//! Code generator errors

use crate::params::MixStrategy;
use poseidon_evm_assembler::AssemblerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("Unsupported width: {inputs} inputs (supported 1..=8)")]
    UnsupportedWidth { inputs: usize },

    #[error("Mix strategy {strategy:?} cannot address width {width}")]
    StrategyUnavailable { strategy: MixStrategy, width: usize },

    #[error("Invalid constants: {0}")]
    InvalidConstants(String),

    #[error("State length mismatch: expected {expected}, got {actual}")]
    StateLength { expected: usize, actual: usize },

    #[error("Input count mismatch: expected {expected}, got {actual}")]
    InputCount { expected: usize, actual: usize },

    #[error("Assembler error: {0}")]
    Assembler(#[from] AssemblerError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodegenError>;
