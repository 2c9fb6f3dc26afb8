//! Runtime error types
//!
//! These are faults of the interpreter or of malformed code. A selector mismatch in a
//! generated program is not an error: it halts with `HaltReason::Invalid`.

use crate::state::HaltReason;
use poseidon_evm_spec::SpecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    #[error("Stack underflow at PC {pc:#x}")]
    StackUnderflow { pc: usize },

    #[error("Stack overflow at PC {pc:#x}")]
    StackOverflow { pc: usize },

    #[error("Invalid jump destination {destination} at PC {pc:#x}")]
    InvalidJump { pc: usize, destination: String },

    #[error("Unknown opcode 0x{byte:02x} at PC {pc:#x}")]
    UnknownOpcode { pc: usize, byte: u8 },

    #[error("Offset does not fit in memory at PC {pc:#x}")]
    OffsetOverflow { pc: usize },

    #[error("Memory limit exceeded: {requested} bytes requested, limit {limit}")]
    MemoryLimitExceeded { requested: usize, limit: usize },

    #[error("Step limit exceeded: {limit}")]
    StepLimitExceeded { limit: u64 },

    #[error("Deployment failed: {0:?}")]
    DeploymentFailed(HaltReason),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
