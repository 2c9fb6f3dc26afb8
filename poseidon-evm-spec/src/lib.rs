//! # Poseidon EVM Core Types
//!
//! Core types shared by the assembler, disassembler, runtime and code generator.
//!
//! ## Key Features
//! - Opcode table for the EVM subset used by generated Poseidon contracts
//! - `Instruction` (opcode + immediate bytes) and `Program` (resolved byte buffer + label table)
//! - BN254 scalar field element `Fr` (p = 0x30644e72...f0000001)
//! - Machine limits: stack reach of `DUP`/`SWAP`, deployed code size, address immediate width

pub mod error;
pub mod field;
pub mod instruction;
pub mod opcode;
pub mod program;

pub use error::{Result, SpecError};
pub use field::{Fr, BN254_MODULUS_HEX};
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::{jump_destinations, Program};

/// Size of a machine word in bytes
pub const WORD_SIZE: usize = 32;

/// Maximum number of items on the operand stack
pub const MAX_STACK_DEPTH: usize = 1024;

/// Deepest zero-based index reachable with `DUP` (DUP16)
pub const MAX_DUP_DEPTH: usize = 15;

/// Deepest index reachable with `SWAP` (SWAP16)
pub const MAX_SWAP_DEPTH: usize = 16;

/// Width in bytes of every label/jump-target immediate
pub const ADDRESS_WIDTH: usize = 3;

/// Deployed code size limit (EIP-170)
pub const MAX_CODE_SIZE: usize = 24_576;

/// Widest push immediate (PUSH32)
pub const MAX_PUSH_WIDTH: usize = 32;
