//! Instruction execution

use crate::error::{Result, RuntimeError};
use crate::memory::Memory;
use crate::state::{HaltReason, VMState};
use crate::word::{from_bool, wrap, wrapping_sub, Word};
use num_bigint::BigUint;
use num_traits::Zero;
use poseidon_evm_spec::{Opcode, WORD_SIZE};
use std::collections::BTreeSet;

/// Read-only inputs of one execution
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub code: &'a [u8],
    pub calldata: &'a [u8],
    pub jump_destinations: &'a BTreeSet<usize>,
}

fn to_offset(value: &Word, pc: usize) -> Result<usize> {
    usize::try_from(value).map_err(|_| RuntimeError::OffsetOverflow { pc })
}

/// Bytes of `src[offset..offset + len]`, zero-filled past the end
fn padded_slice(src: &[u8], offset: &Word, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if let Ok(start) = usize::try_from(offset) {
        if start < src.len() {
            let n = len.min(src.len() - start);
            out[..n].copy_from_slice(&src[start..start + n]);
        }
    }
    out
}

fn binary(state: &mut VMState, f: impl FnOnce(&Word, &Word) -> Word) -> Result<()> {
    let a = state.pop()?;
    let b = state.pop()?;
    state.push(f(&a, &b))
}

fn modular(state: &mut VMState, f: impl FnOnce(&Word, &Word) -> BigUint) -> Result<()> {
    let a = state.pop()?;
    let b = state.pop()?;
    let n = state.pop()?;
    let result = if n.is_zero() {
        BigUint::zero()
    } else {
        f(&a, &b) % &n
    };
    state.push(result)
}

/// Execute the instruction at `state.pc`
///
/// Running past the end of the code halts with `HaltReason::Stop`.
pub fn execute(ctx: &ExecutionContext<'_>, state: &mut VMState, memory: &mut Memory) -> Result<()> {
    let pc = state.pc;
    if pc >= ctx.code.len() {
        state.halt(HaltReason::Stop);
        return Ok(());
    }

    let byte = ctx.code[pc];
    let opcode = Opcode::from_u8(byte).ok_or(RuntimeError::UnknownOpcode { pc, byte })?;
    state.gas_used += opcode.base_gas();
    let mut next_pc = pc + 1 + opcode.immediate_size();

    match opcode {
        Opcode::Stop => state.halt(HaltReason::Stop),

        // ========== Arithmetic ==========
        Opcode::Add => binary(state, |a, b| wrap(a + b))?,
        Opcode::Mul => binary(state, |a, b| wrap(a * b))?,
        Opcode::Sub => binary(state, wrapping_sub)?,
        Opcode::Div => binary(state, |a, b| {
            if b.is_zero() {
                BigUint::zero()
            } else {
                a / b
            }
        })?,
        Opcode::AddMod => modular(state, |a, b| a + b)?,
        Opcode::MulMod => modular(state, |a, b| a * b)?,

        // ========== Comparison and bitwise ==========
        Opcode::Lt => binary(state, |a, b| from_bool(a < b))?,
        Opcode::Gt => binary(state, |a, b| from_bool(a > b))?,
        Opcode::Eq => binary(state, |a, b| from_bool(a == b))?,
        Opcode::IsZero => {
            let a = state.pop()?;
            state.push(from_bool(a.is_zero()))?;
        }
        Opcode::And => binary(state, |a, b| a & b)?,
        Opcode::Or => binary(state, |a, b| a | b)?,

        // ========== Environment ==========
        Opcode::CallDataLoad => {
            let offset = state.pop()?;
            let bytes = padded_slice(ctx.calldata, &offset, WORD_SIZE);
            state.push(BigUint::from_bytes_be(&bytes))?;
        }
        Opcode::CallDataSize => state.push(BigUint::from(ctx.calldata.len()))?,
        Opcode::CodeSize => state.push(BigUint::from(ctx.code.len()))?,
        Opcode::CodeCopy => {
            let dest = state.pop()?;
            let offset = state.pop()?;
            let len = state.pop()?;
            let len = to_offset(&len, pc)?;
            if len > 0 {
                let dest = to_offset(&dest, pc)?;
                state.gas_used += memory.expand(dest, len)?;
                state.gas_used += 3 * len.div_ceil(WORD_SIZE) as u64;
                memory.store_bytes(dest, &padded_slice(ctx.code, &offset, len));
            }
        }

        // ========== Stack and memory ==========
        Opcode::Pop => {
            state.pop()?;
        }
        Opcode::MLoad => {
            let offset = to_offset(&state.pop()?, pc)?;
            state.gas_used += memory.expand(offset, WORD_SIZE)?;
            state.push(memory.load_word(offset))?;
        }
        Opcode::MStore => {
            let offset = to_offset(&state.pop()?, pc)?;
            let value = state.pop()?;
            state.gas_used += memory.expand(offset, WORD_SIZE)?;
            memory.store_word(offset, &value);
        }
        Opcode::Push(n) => {
            let imm = padded_slice(ctx.code, &BigUint::from(pc + 1), n as usize);
            state.push(BigUint::from_bytes_be(&imm))?;
        }
        Opcode::Dup(n) => state.dup(n as usize)?,
        Opcode::Swap(n) => state.swap(n as usize)?,

        // ========== Flow ==========
        Opcode::Jump => {
            let dest = state.pop()?;
            next_pc = jump_target(ctx, &dest, pc)?;
        }
        Opcode::JumpI => {
            let dest = state.pop()?;
            let cond = state.pop()?;
            if !cond.is_zero() {
                next_pc = jump_target(ctx, &dest, pc)?;
            }
        }
        Opcode::JumpDest => {}

        // ========== System ==========
        Opcode::Return | Opcode::Revert => {
            let offset = state.pop()?;
            let len = to_offset(&state.pop()?, pc)?;
            if len > 0 {
                let offset = to_offset(&offset, pc)?;
                state.gas_used += memory.expand(offset, len)?;
                state.return_data = memory.read(offset, len);
            }
            state.halt(if opcode == Opcode::Return {
                HaltReason::Return
            } else {
                HaltReason::Revert
            });
        }
        Opcode::Invalid => {
            state.return_data.clear();
            state.halt(HaltReason::Invalid);
        }
    }

    state.pc = next_pc;
    Ok(())
}

fn jump_target(ctx: &ExecutionContext<'_>, dest: &Word, pc: usize) -> Result<usize> {
    usize::try_from(dest)
        .ok()
        .filter(|target| ctx.jump_destinations.contains(target))
        .ok_or_else(|| RuntimeError::InvalidJump {
            pc,
            destination: format!("{:#x}", dest),
        })
}
