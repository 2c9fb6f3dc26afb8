//! Instruction encoding to bytecode
//!
//! Every instruction is one opcode byte followed by its big-endian immediate.

use crate::error::{AssemblerError, Result};
use num_bigint::BigUint;
use num_traits::Zero;
use poseidon_evm_spec::{Instruction, MAX_PUSH_WIDTH};

/// Encode an instruction to bytes
pub fn encode(instr: &Instruction) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(instr.size());
    encode_into(instr, &mut out)?;
    Ok(out)
}

/// Append the encoding of an instruction to `out`
///
/// Malformed instructions are rejected before anything is written, so `out` never
/// holds a push whose immediate runs into the next instruction.
pub fn encode_into(instr: &Instruction, out: &mut Vec<u8>) -> Result<()> {
    instr.validate()?;
    out.push(instr.opcode.to_u8());
    out.extend_from_slice(&instr.immediate);
    Ok(())
}

/// Minimum number of bytes needed to represent `value` (at least one)
pub fn minimal_width(value: &BigUint) -> usize {
    if value.is_zero() {
        1
    } else {
        ((value.bits() + 7) / 8) as usize
    }
}

/// Big-endian encoding of `value` left-padded to exactly `width` bytes
pub fn encode_word(value: &BigUint, width: usize) -> Result<Vec<u8>> {
    if width == 0 || width > MAX_PUSH_WIDTH {
        return Err(AssemblerError::ImmediateTooWide(width));
    }
    let needed = minimal_width(value);
    if needed > width {
        return Err(AssemblerError::ImmediateTooWide(needed));
    }
    let bytes = if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    };
    let mut out = vec![0u8; width - bytes.len()];
    out.extend_from_slice(&bytes);
    Ok(out)
}
