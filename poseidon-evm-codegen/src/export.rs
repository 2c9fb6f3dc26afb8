//! # Assembled Program Export
//!
//! The finished runtime code together with everything a caller needs to deploy
//! and call it: creation code, interface descriptor, selectors and a calldata
//! builder.

use crate::abi::{self, ArgEncoding, InterfaceDescriptor};
use crate::error::{CodegenError, Result};
use crate::params::{MixStrategy, PoseidonParams};
use num_bigint::BigUint;
use poseidon_evm_assembler::Assembler;
use poseidon_evm_spec::{Fr, Program, ADDRESS_WIDTH, MAX_CODE_SIZE, WORD_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the deployment loader prepended by [`AssembledProgram::creation_code`]
///
/// ```text
/// Offset  Size  Instruction
/// ──────────────────────────────────
/// 0x00    4     PUSH3 runtime_len
/// 0x04    1     DUP1
/// 0x05    4     PUSH3 0x00000f
/// 0x09    2     PUSH1 0
/// 0x0B    1     CODECOPY
/// 0x0C    2     PUSH1 0
/// 0x0E    1     RETURN
/// ```
pub const LOADER_SIZE: usize = 15;

/// Selector length on the wire
pub const SELECTOR_SIZE: usize = 4;

/// A generated Poseidon program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledProgram {
    pub params: PoseidonParams,

    /// Entry-point name the selectors are derived from
    pub function_name: String,

    /// Dense-mix strategy the code was generated with (never `Auto`)
    pub strategy: MixStrategy,

    /// Resolved runtime code and its labels
    pub runtime: Program,

    pub interface: InterfaceDescriptor,
}

impl AssembledProgram {
    pub fn n_inputs(&self) -> usize {
        self.params.n_inputs()
    }

    /// Runtime bytecode
    pub fn code(&self) -> &[u8] {
        &self.runtime.code
    }

    pub fn code_size(&self) -> usize {
        self.runtime.size()
    }

    pub fn exceeds_code_size_limit(&self) -> bool {
        self.runtime.exceeds_code_size_limit()
    }

    /// Deployment bytes: a loader that copies and returns the runtime code
    pub fn creation_code(&self) -> Result<Vec<u8>> {
        let len = BigUint::from(self.code_size());

        let mut asm = Assembler::new();
        asm.push_fixed(&len, ADDRESS_WIDTH)?;
        asm.dup(0)?;
        asm.push_fixed(&BigUint::from(LOADER_SIZE), ADDRESS_WIDTH)?;
        asm.push_u64(0);
        asm.code_copy();
        asm.push_u64(0);
        asm.ret();

        let mut code = asm.resolve()?.code;
        code.extend_from_slice(self.code());
        Ok(code)
    }

    /// Selector accepted for `encoding`
    pub fn selector(&self, encoding: ArgEncoding) -> [u8; SELECTOR_SIZE] {
        abi::selector(&abi::signature(
            &self.function_name,
            encoding,
            self.n_inputs(),
        ))
    }

    /// Both accepted selectors, `uint256` first
    pub fn selectors(&self) -> [[u8; SELECTOR_SIZE]; 2] {
        [
            self.selector(ArgEncoding::Uint256),
            self.selector(ArgEncoding::Bytes32),
        ]
    }

    /// Call input: selector followed by one big-endian word per input
    pub fn calldata(&self, encoding: ArgEncoding, inputs: &[Fr]) -> Result<Vec<u8>> {
        if inputs.len() != self.n_inputs() {
            return Err(CodegenError::InputCount {
                expected: self.n_inputs(),
                actual: inputs.len(),
            });
        }
        let mut data = Vec::with_capacity(SELECTOR_SIZE + WORD_SIZE * inputs.len());
        data.extend_from_slice(&self.selector(encoding));
        for input in inputs {
            data.extend_from_slice(&input.to_bytes_be());
        }
        Ok(data)
    }

    pub fn size_report(&self) -> SizeReport {
        SizeReport {
            width: self.params.width,
            runtime_size: self.code_size(),
            creation_size: LOADER_SIZE + self.code_size(),
            limit: MAX_CODE_SIZE,
        }
    }
}

/// Code size of one program against the deployed-code limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeReport {
    pub width: usize,
    pub runtime_size: usize,
    pub creation_size: usize,
    pub limit: usize,
}

impl SizeReport {
    pub fn exceeds_limit(&self) -> bool {
        self.runtime_size > self.limit
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={}: runtime {} bytes, creation {} bytes (limit {}){}",
            self.width,
            self.runtime_size,
            self.creation_size,
            self.limit,
            if self.exceeds_limit() { " EXCEEDS LIMIT" } else { "" }
        )
    }
}
