//! VM state: program counter, operand stack and halt status

use crate::error::{Result, RuntimeError};
use crate::word::Word;
use poseidon_evm_spec::MAX_STACK_DEPTH;

/// Why execution stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// STOP, or execution ran off the end of the code
    Stop,
    /// RETURN with output data
    Return,
    /// REVERT with output data
    Revert,
    /// INVALID: abort with no output
    Invalid,
}

#[derive(Debug, Clone, Default)]
pub struct VMState {
    /// Program counter
    pub pc: usize,

    /// Operand stack, top is the last element
    pub stack: Vec<Word>,

    /// Executed instruction count
    pub steps: u64,

    /// Gas charged so far
    pub gas_used: u64,

    /// Set once the program halts
    pub halt_reason: Option<HaltReason>,

    /// Output of RETURN/REVERT
    pub return_data: Vec<u8>,
}

impl VMState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_halted(&self) -> bool {
        self.halt_reason.is_some()
    }

    pub fn halt(&mut self, reason: HaltReason) {
        self.halt_reason = Some(reason);
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self, value: Word) -> Result<()> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(RuntimeError::StackOverflow { pc: self.pc });
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Word> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { pc: self.pc })
    }

    /// Item `depth` slots below the top (0 = top)
    pub fn peek(&self, depth: usize) -> Result<&Word> {
        let len = self.stack.len();
        if depth >= len {
            return Err(RuntimeError::StackUnderflow { pc: self.pc });
        }
        Ok(&self.stack[len - 1 - depth])
    }

    /// DUPn: copy the n-th item (1 = top) onto the top
    pub fn dup(&mut self, n: usize) -> Result<()> {
        let value = self.peek(n - 1)?.clone();
        self.push(value)
    }

    /// SWAPn: exchange the top with the (n+1)-th item
    pub fn swap(&mut self, n: usize) -> Result<()> {
        let len = self.stack.len();
        if n >= len {
            return Err(RuntimeError::StackUnderflow { pc: self.pc });
        }
        self.stack.swap(len - 1, len - 1 - n);
        Ok(())
    }
}
