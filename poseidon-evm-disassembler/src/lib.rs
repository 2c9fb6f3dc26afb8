//! # Poseidon EVM Disassembler
//!
//! Decode EVM bytecode back into instructions, print annotated listings and
//! analyse static jump targets.
//!
//! ## Example
//!
//! ```rust
//! use poseidon_evm_disassembler::{decode, disassemble, format};
//! use poseidon_evm_spec::Program;
//!
//! let program = Program::new(vec![0x60, 0x20, 0x60, 0x00, 0xf3]);
//! let decoded = decode(&program.code).unwrap();
//! assert_eq!(format(&decoded[0].instruction), "PUSH1 0x20");
//! println!("{}", disassemble(&program));
//! ```

pub mod analysis;
pub mod decoder;
pub mod disassembler;
pub mod error;
pub mod formatter;

pub use analysis::{indirect_jump_count, invalid_jump_targets, jump_targets, JumpTarget};
pub use decoder::{decode, decode_at, DecodedInstruction};
pub use disassembler::disassemble;
pub use error::{DisassemblerError, Result};
pub use formatter::format;
