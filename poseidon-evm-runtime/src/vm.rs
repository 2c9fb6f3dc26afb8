//! Virtual Machine for generated Poseidon contracts

use crate::error::{Result, RuntimeError};
use crate::execute::{execute, ExecutionContext};
use crate::memory::Memory;
use crate::state::{HaltReason, VMState};
use num_bigint::BigUint;
use poseidon_evm_spec::{jump_destinations, Opcode, Program, WORD_SIZE};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// VM configuration
#[derive(Debug, Clone)]
pub struct VMConfig {
    /// Maximum number of executed instructions before giving up
    pub max_steps: u64,

    /// Log every executed instruction at TRACE level
    pub trace: bool,

    /// Maximum memory size in bytes
    pub memory_limit: usize,
}

impl Default for VMConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000_000,
            trace: false,
            memory_limit: 1 << 20,
        }
    }
}

/// Execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Reason for halting
    pub halt_reason: HaltReason,

    /// Output of RETURN/REVERT, empty otherwise
    pub return_data: Vec<u8>,

    /// Number of instructions executed
    pub steps: u64,

    /// Static gas plus memory expansion and copy costs
    pub gas_used: u64,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self.halt_reason, HaltReason::Return | HaltReason::Stop)
    }

    /// The return data as one 32-byte word, if that is exactly what was returned
    pub fn return_word(&self) -> Option<BigUint> {
        if self.halt_reason == HaltReason::Return && self.return_data.len() == WORD_SIZE {
            Some(BigUint::from_bytes_be(&self.return_data))
        } else {
            None
        }
    }
}

/// EVM-subset interpreter
pub struct VM {
    code: Vec<u8>,
    calldata: Vec<u8>,
    jump_destinations: BTreeSet<usize>,
    state: VMState,
    memory: Memory,
    config: VMConfig,
}

impl VM {
    /// Create a VM for `code` called with `calldata`
    pub fn new(code: Vec<u8>, calldata: Vec<u8>, config: VMConfig) -> Self {
        let jump_destinations = jump_destinations(&code);
        let memory = Memory::new(config.memory_limit);
        Self {
            code,
            calldata,
            jump_destinations,
            state: VMState::new(),
            memory,
            config,
        }
    }

    pub fn from_program(program: &Program, calldata: Vec<u8>, config: VMConfig) -> Self {
        Self::new(program.code.clone(), calldata, config)
    }

    /// Run until halt
    pub fn run(mut self) -> Result<ExecutionResult> {
        let ctx = ExecutionContext {
            code: &self.code,
            calldata: &self.calldata,
            jump_destinations: &self.jump_destinations,
        };

        while !self.state.is_halted() {
            if self.state.steps >= self.config.max_steps {
                return Err(RuntimeError::StepLimitExceeded {
                    limit: self.config.max_steps,
                });
            }

            if self.config.trace {
                let op = ctx
                    .code
                    .get(self.state.pc)
                    .and_then(|&b| Opcode::from_u8(b))
                    .map(|op| op.mnemonic())
                    .unwrap_or_else(|| "-".to_string());
                trace!(
                    step = self.state.steps,
                    pc = self.state.pc,
                    depth = self.state.depth(),
                    "{}",
                    op
                );
            }

            execute(&ctx, &mut self.state, &mut self.memory)?;
            self.state.steps += 1;
        }

        let halt_reason = self.state.halt_reason.unwrap_or(HaltReason::Stop);
        debug!(
            ?halt_reason,
            steps = self.state.steps,
            gas = self.state.gas_used,
            "execution halted"
        );

        Ok(ExecutionResult {
            halt_reason,
            return_data: std::mem::take(&mut self.state.return_data),
            steps: self.state.steps,
            gas_used: self.state.gas_used,
        })
    }
}
