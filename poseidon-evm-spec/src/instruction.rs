//! Instruction representation
//!
//! An instruction is one opcode plus its immediate bytes. Only `PUSHn` carries an
//! immediate; its length always equals the width encoded in the opcode.

use crate::error::{Result, SpecError};
use crate::opcode::Opcode;
use crate::MAX_PUSH_WIDTH;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub immediate: Vec<u8>,
}

impl Instruction {
    /// Instruction without immediate; `PUSHn` is rejected
    pub fn new(opcode: Opcode) -> Result<Self> {
        Self::with_immediate(opcode, Vec::new())
    }

    /// Instruction with an explicit immediate, checked against the opcode width
    pub fn with_immediate(opcode: Opcode, immediate: Vec<u8>) -> Result<Self> {
        let instr = Self { opcode, immediate };
        instr.validate()?;
        Ok(instr)
    }

    /// Check the opcode index and that the immediate length matches it
    ///
    /// The fields are public, so an instruction built by hand (or deserialized) is
    /// only well formed once this passes.
    pub fn validate(&self) -> Result<()> {
        self.opcode.validate()?;
        let expected = self.opcode.immediate_size();
        if self.immediate.len() != expected {
            return Err(SpecError::ImmediateLength {
                opcode: self.opcode.mnemonic(),
                expected,
                actual: self.immediate.len(),
            });
        }
        Ok(())
    }

    /// `PUSHn` where n is the length of `bytes` (big-endian)
    pub fn push(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() || bytes.len() > MAX_PUSH_WIDTH {
            return Err(SpecError::ImmediateLength {
                opcode: "PUSH".to_string(),
                expected: MAX_PUSH_WIDTH,
                actual: bytes.len(),
            });
        }
        let width = bytes.len() as u8;
        Self::with_immediate(Opcode::Push(width), bytes)
    }

    /// Encoded length in bytes
    pub fn size(&self) -> usize {
        1 + self.immediate.len()
    }

    /// Immediate interpreted as a big-endian unsigned integer
    pub fn immediate_value(&self) -> Option<BigUint> {
        if self.immediate.is_empty() {
            None
        } else {
            Some(BigUint::from_bytes_be(&self.immediate))
        }
    }
}
