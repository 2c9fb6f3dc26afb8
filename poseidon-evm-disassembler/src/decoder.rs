//! Byte-stream decoding
//!
//! Decoding is linear: push immediates are skipped as data, so a `0x5b` byte inside a
//! PUSH32 constant never decodes as a `JUMPDEST`.

use crate::error::{DisassemblerError, Result};
use poseidon_evm_spec::{Instruction, Opcode};

/// An instruction together with the offset it was decoded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub offset: usize,
    pub instruction: Instruction,
}

impl DecodedInstruction {
    /// Offset of the following instruction
    pub fn next_offset(&self) -> usize {
        self.offset + self.instruction.size()
    }
}

/// Decode the instruction starting at `offset`
pub fn decode_at(code: &[u8], offset: usize) -> Result<DecodedInstruction> {
    let byte = code[offset];
    let opcode =
        Opcode::from_u8(byte).ok_or(DisassemblerError::UnknownOpcode { offset, byte })?;

    let expected = opcode.immediate_size();
    let start = offset + 1;
    let available = code.len().saturating_sub(start);
    if available < expected {
        return Err(DisassemblerError::TruncatedImmediate {
            offset,
            expected,
            available,
        });
    }

    Ok(DecodedInstruction {
        offset,
        instruction: Instruction {
            opcode,
            immediate: code[start..start + expected].to_vec(),
        },
    })
}

/// Decode a whole buffer, failing on the first malformed instruction
pub fn decode(code: &[u8]) -> Result<Vec<DecodedInstruction>> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        let decoded = decode_at(code, offset)?;
        offset = decoded.next_offset();
        out.push(decoded);
    }
    Ok(out)
}
