//! Disassembler errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisassemblerError {
    #[error("Unknown opcode 0x{byte:02X} at offset 0x{offset:04X}")]
    UnknownOpcode { offset: usize, byte: u8 },

    #[error("Truncated immediate at offset 0x{offset:04X}: expected {expected} bytes, found {available}")]
    TruncatedImmediate {
        offset: usize,
        expected: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;
