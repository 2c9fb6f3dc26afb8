//! Error types for the Poseidon EVM core types

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("Unknown opcode: 0x{0:02x}")]
    UnknownOpcode(u8),

    #[error("Invalid immediate for {opcode}: expected {expected} bytes, got {actual}")]
    ImmediateLength {
        opcode: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid {family} index: {index} (valid range 1..={max})")]
    OpcodeIndex {
        family: &'static str,
        index: u8,
        max: u8,
    },

    #[error("Invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("Field element not in canonical range: {0}")]
    NonCanonical(String),
}

pub type Result<T> = std::result::Result<T, SpecError>;
