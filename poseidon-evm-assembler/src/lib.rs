//! Poseidon EVM Assembler
//!
//! Emit EVM instructions into a byte buffer, reference jump targets by name and
//! resolve them in a single fixed-width pass.
//!
//! ## Example
//!
//! ```rust
//! use poseidon_evm_assembler::Assembler;
//!
//! let mut asm = Assembler::new();
//! asm.push_u64(1);
//! asm.jump_if("done");
//! asm.invalid();
//! asm.label("done").unwrap();
//! asm.stop();
//!
//! let program = asm.resolve().unwrap();
//! assert_eq!(program.label_offset("done"), Some(8));
//! ```

pub mod assembler;
pub mod encoder;
pub mod error;

pub use assembler::{Assembler, JumpReference};
pub use encoder::{encode, encode_into, encode_word, minimal_width};
pub use error::{AssemblerError, Result};
