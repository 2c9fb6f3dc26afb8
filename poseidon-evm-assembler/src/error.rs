//! Assembler errors

use poseidon_evm_spec::SpecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("Invalid {op} depth: {depth} (valid range {min}..={max})")]
    InvalidDepth {
        op: &'static str,
        depth: usize,
        min: usize,
        max: usize,
    },

    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("Unresolved label: {0}")]
    UnresolvedLabel(String),

    #[error("Label {label} at offset {offset:#x} does not fit a {width}-byte address")]
    LabelOutOfRange {
        label: String,
        offset: usize,
        width: usize,
    },

    #[error("Immediate too wide: {0} bytes")]
    ImmediateTooWide(usize),

    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
