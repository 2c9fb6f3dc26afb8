//! # EVM Opcode Definitions
//!
//! The opcode subset emitted by the Poseidon code generator and its deployment
//! loader, plus a few neighbours that are convenient in hand-written test programs.
//!
//! ## Opcode Encoding
//!
//! - 0x00-0x09: Stop and arithmetic (STOP, ADD, MUL, SUB, DIV, ADDMOD, MULMOD)
//! - 0x10-0x17: Comparison and bitwise (LT, GT, EQ, ISZERO, AND, OR)
//! - 0x35-0x39: Environment (CALLDATALOAD, CALLDATASIZE, CODESIZE, CODECOPY)
//! - 0x50-0x5b: Stack, memory and flow (POP, MLOAD, MSTORE, JUMP, JUMPI, JUMPDEST)
//! - 0x60-0x7f: PUSH1-PUSH32 (immediate of 1-32 bytes)
//! - 0x80-0x8f: DUP1-DUP16
//! - 0x90-0x9f: SWAP1-SWAP16
//! - 0xf3-0xfe: System (RETURN, REVERT, INVALID)

use crate::error::{Result, SpecError};
use crate::{MAX_DUP_DEPTH, MAX_PUSH_WIDTH, MAX_SWAP_DEPTH};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruction opcode
///
/// `Push(n)` carries the immediate width (1..=32). `Dup(n)` and `Swap(n)` carry the
/// mnemonic index (1..=16), i.e. `Dup(1)` duplicates the top of the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // ========== Stop and arithmetic ==========
    /// STOP: halt with no return data
    Stop,
    /// ADD: a + b (mod 2^256)
    Add,
    /// MUL: a * b (mod 2^256)
    Mul,
    /// SUB: a - b (mod 2^256)
    Sub,
    /// DIV: a / b, 0 if b == 0
    Div,
    /// ADDMOD: (a + b) % n, 0 if n == 0
    AddMod,
    /// MULMOD: (a * b) % n, 0 if n == 0
    MulMod,

    // ========== Comparison and bitwise ==========
    /// LT: a < b
    Lt,
    /// GT: a > b
    Gt,
    /// EQ: a == b
    Eq,
    /// ISZERO: a == 0
    IsZero,
    /// AND: a & b
    And,
    /// OR: a | b
    Or,

    // ========== Environment ==========
    /// CALLDATALOAD: 32 bytes of call input at offset, zero padded
    CallDataLoad,
    /// CALLDATASIZE: length of call input
    CallDataSize,
    /// CODESIZE: length of executing code
    CodeSize,
    /// CODECOPY: memory[dest..dest+len] = code[offset..offset+len]
    CodeCopy,

    // ========== Stack, memory and flow ==========
    /// POP: discard top of stack
    Pop,
    /// MLOAD: load 32-byte word from memory
    MLoad,
    /// MSTORE: store 32-byte word to memory
    MStore,
    /// JUMP: unconditional jump to top of stack
    Jump,
    /// JUMPI: jump if condition is non-zero
    JumpI,
    /// JUMPDEST: valid jump target marker
    JumpDest,

    /// PUSHn: push an n-byte big-endian immediate
    Push(u8),
    /// DUPn: duplicate the n-th stack item
    Dup(u8),
    /// SWAPn: exchange top with the (n+1)-th stack item
    Swap(u8),

    // ========== System ==========
    /// RETURN: halt returning memory[offset..offset+len]
    Return,
    /// REVERT: halt reverting with memory[offset..offset+len]
    Revert,
    /// INVALID: abort, discarding all state
    Invalid,
}

impl Opcode {
    /// Decode an opcode byte
    pub fn from_u8(byte: u8) -> Option<Self> {
        let op = match byte {
            0x00 => Opcode::Stop,
            0x01 => Opcode::Add,
            0x02 => Opcode::Mul,
            0x03 => Opcode::Sub,
            0x04 => Opcode::Div,
            0x08 => Opcode::AddMod,
            0x09 => Opcode::MulMod,
            0x10 => Opcode::Lt,
            0x11 => Opcode::Gt,
            0x14 => Opcode::Eq,
            0x15 => Opcode::IsZero,
            0x16 => Opcode::And,
            0x17 => Opcode::Or,
            0x35 => Opcode::CallDataLoad,
            0x36 => Opcode::CallDataSize,
            0x38 => Opcode::CodeSize,
            0x39 => Opcode::CodeCopy,
            0x50 => Opcode::Pop,
            0x51 => Opcode::MLoad,
            0x52 => Opcode::MStore,
            0x56 => Opcode::Jump,
            0x57 => Opcode::JumpI,
            0x5b => Opcode::JumpDest,
            0x60..=0x7f => Opcode::Push(byte - 0x5f),
            0x80..=0x8f => Opcode::Dup(byte - 0x7f),
            0x90..=0x9f => Opcode::Swap(byte - 0x8f),
            0xf3 => Opcode::Return,
            0xfd => Opcode::Revert,
            0xfe => Opcode::Invalid,
            _ => return None,
        };
        Some(op)
    }

    /// Check the family index of `Push`, `Dup` and `Swap`
    pub fn validate(self) -> Result<()> {
        let (family, index, max) = match self {
            Opcode::Push(n) => ("PUSH", n, MAX_PUSH_WIDTH as u8),
            Opcode::Dup(n) => ("DUP", n, (MAX_DUP_DEPTH + 1) as u8),
            Opcode::Swap(n) => ("SWAP", n, MAX_SWAP_DEPTH as u8),
            _ => return Ok(()),
        };
        if index == 0 || index > max {
            return Err(SpecError::OpcodeIndex { family, index, max });
        }
        Ok(())
    }

    /// Encode to the opcode byte
    ///
    /// Only meaningful for opcodes that pass [`Opcode::validate`]; out-of-range family
    /// indices are clamped into their family.
    pub fn to_u8(self) -> u8 {
        match self {
            Opcode::Stop => 0x00,
            Opcode::Add => 0x01,
            Opcode::Mul => 0x02,
            Opcode::Sub => 0x03,
            Opcode::Div => 0x04,
            Opcode::AddMod => 0x08,
            Opcode::MulMod => 0x09,
            Opcode::Lt => 0x10,
            Opcode::Gt => 0x11,
            Opcode::Eq => 0x14,
            Opcode::IsZero => 0x15,
            Opcode::And => 0x16,
            Opcode::Or => 0x17,
            Opcode::CallDataLoad => 0x35,
            Opcode::CallDataSize => 0x36,
            Opcode::CodeSize => 0x38,
            Opcode::CodeCopy => 0x39,
            Opcode::Pop => 0x50,
            Opcode::MLoad => 0x51,
            Opcode::MStore => 0x52,
            Opcode::Jump => 0x56,
            Opcode::JumpI => 0x57,
            Opcode::JumpDest => 0x5b,
            Opcode::Push(n) => 0x5f + n.clamp(1, 32),
            Opcode::Dup(n) => 0x7f + n.clamp(1, 16),
            Opcode::Swap(n) => 0x8f + n.clamp(1, 16),
            Opcode::Return => 0xf3,
            Opcode::Revert => 0xfd,
            Opcode::Invalid => 0xfe,
        }
    }

    /// Number of immediate bytes following the opcode byte
    pub fn immediate_size(self) -> usize {
        match self {
            Opcode::Push(n) => n as usize,
            _ => 0,
        }
    }

    /// Number of stack items consumed
    pub fn stack_inputs(self) -> usize {
        match self {
            Opcode::Stop
            | Opcode::JumpDest
            | Opcode::Push(_)
            | Opcode::CallDataSize
            | Opcode::CodeSize
            | Opcode::Invalid => 0,
            Opcode::IsZero | Opcode::CallDataLoad | Opcode::Pop | Opcode::MLoad | Opcode::Jump => 1,
            Opcode::Add
            | Opcode::Mul
            | Opcode::Sub
            | Opcode::Div
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or
            | Opcode::MStore
            | Opcode::JumpI
            | Opcode::Return
            | Opcode::Revert => 2,
            Opcode::AddMod | Opcode::MulMod | Opcode::CodeCopy => 3,
            Opcode::Dup(n) => n as usize,
            Opcode::Swap(n) => n as usize + 1,
        }
    }

    /// Number of stack items produced
    pub fn stack_outputs(self) -> usize {
        match self {
            Opcode::Stop
            | Opcode::Pop
            | Opcode::MStore
            | Opcode::Jump
            | Opcode::JumpI
            | Opcode::JumpDest
            | Opcode::CodeCopy
            | Opcode::Return
            | Opcode::Revert
            | Opcode::Invalid => 0,
            Opcode::Dup(n) => n as usize + 1,
            Opcode::Swap(n) => n as usize + 1,
            _ => 1,
        }
    }

    /// Static gas cost (dynamic memory and copy costs are charged by the runtime)
    pub fn base_gas(self) -> u64 {
        match self {
            Opcode::Stop | Opcode::Return | Opcode::Revert | Opcode::Invalid => 0,
            Opcode::JumpDest => 1,
            Opcode::CallDataSize | Opcode::CodeSize | Opcode::Pop => 2,
            Opcode::Add
            | Opcode::Sub
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::IsZero
            | Opcode::And
            | Opcode::Or
            | Opcode::CallDataLoad
            | Opcode::CodeCopy
            | Opcode::MLoad
            | Opcode::MStore
            | Opcode::Push(_)
            | Opcode::Dup(_)
            | Opcode::Swap(_) => 3,
            Opcode::Mul | Opcode::Div => 5,
            Opcode::AddMod | Opcode::MulMod | Opcode::Jump => 8,
            Opcode::JumpI => 10,
        }
    }

    /// Whether execution never falls through to the next instruction
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Opcode::Stop | Opcode::Jump | Opcode::Return | Opcode::Revert | Opcode::Invalid
        )
    }

    /// Get the mnemonic
    pub fn mnemonic(self) -> String {
        match self {
            Opcode::Push(n) => format!("PUSH{}", n),
            Opcode::Dup(n) => format!("DUP{}", n),
            Opcode::Swap(n) => format!("SWAP{}", n),
            other => other.fixed_mnemonic().to_string(),
        }
    }

    fn fixed_mnemonic(self) -> &'static str {
        match self {
            Opcode::Stop => "STOP",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Sub => "SUB",
            Opcode::Div => "DIV",
            Opcode::AddMod => "ADDMOD",
            Opcode::MulMod => "MULMOD",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::IsZero => "ISZERO",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::CallDataLoad => "CALLDATALOAD",
            Opcode::CallDataSize => "CALLDATASIZE",
            Opcode::CodeSize => "CODESIZE",
            Opcode::CodeCopy => "CODECOPY",
            Opcode::Pop => "POP",
            Opcode::MLoad => "MLOAD",
            Opcode::MStore => "MSTORE",
            Opcode::Jump => "JUMP",
            Opcode::JumpI => "JUMPI",
            Opcode::JumpDest => "JUMPDEST",
            Opcode::Return => "RETURN",
            Opcode::Revert => "REVERT",
            Opcode::Invalid => "INVALID",
            Opcode::Push(_) => "PUSH",
            Opcode::Dup(_) => "DUP",
            Opcode::Swap(_) => "SWAP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic())
    }
}
