//! Instruction emitter and label resolver
//!
//! The assembler appends instructions to a growing byte buffer. Jump targets are
//! referenced by name; every reference reserves a fixed-width (`ADDRESS_WIDTH`) push
//! immediate, so a single pass in [`Assembler::resolve`] patches all placeholders
//! without changing any instruction length.

use crate::encoder::{encode_into, encode_word, minimal_width};
use crate::error::{AssemblerError, Result};
use num_bigint::BigUint;
use poseidon_evm_spec::{
    Fr, Instruction, Opcode, Program, ADDRESS_WIDTH, MAX_DUP_DEPTH, MAX_PUSH_WIDTH,
    MAX_SWAP_DEPTH,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Placeholder awaiting the offset of `label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpReference {
    /// Offset of the first immediate byte
    pub offset: usize,
    pub label: String,
}

#[derive(Debug, Default)]
pub struct Assembler {
    code: Vec<u8>,
    labels: BTreeMap<String, usize>,
    references: Vec<JumpReference>,
    next_fresh: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current end-of-buffer offset
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Bytes emitted so far (placeholders still zeroed)
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn label_offset(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn pending_references(&self) -> &[JumpReference] {
        &self.references
    }

    /// Append an arbitrary instruction, rejecting malformed ones
    pub fn emit(&mut self, instr: &Instruction) -> Result<()> {
        encode_into(instr, &mut self.code)
    }

    fn op(&mut self, opcode: Opcode) {
        self.code.push(opcode.to_u8());
    }

    // ========== Push ==========

    /// Push `value` using the narrowest PUSHn that holds it
    pub fn push(&mut self, value: &BigUint) -> Result<()> {
        let width = minimal_width(value);
        self.push_fixed(value, width)
    }

    pub fn push_u64(&mut self, value: u64) {
        let width = minimal_width(&BigUint::from(value));
        let bytes = value.to_be_bytes();
        self.op(Opcode::Push(width as u8));
        self.code.extend_from_slice(&bytes[8 - width..]);
    }

    /// Push `value` with an exact immediate width
    pub fn push_fixed(&mut self, value: &BigUint, width: usize) -> Result<()> {
        let bytes = encode_word(value, width)?;
        self.op(Opcode::Push(width as u8));
        self.code.extend_from_slice(&bytes);
        Ok(())
    }

    /// Push a field element as a full PUSH32, independent of its magnitude
    pub fn push_word(&mut self, value: &Fr) {
        self.op(Opcode::Push(MAX_PUSH_WIDTH as u8));
        self.code.extend_from_slice(&value.to_bytes_be());
    }

    // ========== Stack ==========

    /// Duplicate the item `depth` slots below the top (0 = top)
    pub fn dup(&mut self, depth: usize) -> Result<()> {
        if depth > MAX_DUP_DEPTH {
            return Err(AssemblerError::InvalidDepth {
                op: "dup",
                depth,
                min: 0,
                max: MAX_DUP_DEPTH,
            });
        }
        self.op(Opcode::Dup(depth as u8 + 1));
        Ok(())
    }

    /// Exchange the top with the item `depth` slots below it
    pub fn swap(&mut self, depth: usize) -> Result<()> {
        if depth == 0 || depth > MAX_SWAP_DEPTH {
            return Err(AssemblerError::InvalidDepth {
                op: "swap",
                depth,
                min: 1,
                max: MAX_SWAP_DEPTH,
            });
        }
        self.op(Opcode::Swap(depth as u8));
        Ok(())
    }

    pub fn pop(&mut self) {
        self.op(Opcode::Pop);
    }

    // ========== Arithmetic ==========

    pub fn add(&mut self) {
        self.op(Opcode::Add);
    }

    pub fn mul(&mut self) {
        self.op(Opcode::Mul);
    }

    pub fn sub(&mut self) {
        self.op(Opcode::Sub);
    }

    pub fn div(&mut self) {
        self.op(Opcode::Div);
    }

    pub fn add_mod(&mut self) {
        self.op(Opcode::AddMod);
    }

    pub fn mul_mod(&mut self) {
        self.op(Opcode::MulMod);
    }

    pub fn lt(&mut self) {
        self.op(Opcode::Lt);
    }

    pub fn gt(&mut self) {
        self.op(Opcode::Gt);
    }

    pub fn eq(&mut self) {
        self.op(Opcode::Eq);
    }

    pub fn is_zero(&mut self) {
        self.op(Opcode::IsZero);
    }

    pub fn and(&mut self) {
        self.op(Opcode::And);
    }

    pub fn or(&mut self) {
        self.op(Opcode::Or);
    }

    // ========== Environment and memory ==========

    pub fn call_data_load(&mut self) {
        self.op(Opcode::CallDataLoad);
    }

    pub fn call_data_size(&mut self) {
        self.op(Opcode::CallDataSize);
    }

    pub fn code_size(&mut self) {
        self.op(Opcode::CodeSize);
    }

    pub fn code_copy(&mut self) {
        self.op(Opcode::CodeCopy);
    }

    pub fn mload(&mut self) {
        self.op(Opcode::MLoad);
    }

    pub fn mstore(&mut self) {
        self.op(Opcode::MStore);
    }

    // ========== Termination ==========

    pub fn stop(&mut self) {
        self.op(Opcode::Stop);
    }

    pub fn ret(&mut self) {
        self.op(Opcode::Return);
    }

    pub fn revert(&mut self) {
        self.op(Opcode::Revert);
    }

    pub fn invalid(&mut self) {
        self.op(Opcode::Invalid);
    }

    // ========== Labels and jumps ==========

    /// Name unique within this assembler, `{prefix}_{n}`
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let name = format!("{}_{}", prefix, self.next_fresh);
        self.next_fresh += 1;
        name
    }

    /// Bind `name` to the current offset and emit the `JUMPDEST` it marks
    pub fn label(&mut self, name: &str) -> Result<()> {
        if self.labels.contains_key(name) {
            return Err(AssemblerError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), self.code.len());
        self.op(Opcode::JumpDest);
        Ok(())
    }

    /// Push the (future) offset of `name` as a fixed-width placeholder
    pub fn push_label(&mut self, name: &str) {
        self.op(Opcode::Push(ADDRESS_WIDTH as u8));
        self.references.push(JumpReference {
            offset: self.code.len(),
            label: name.to_string(),
        });
        self.code.extend_from_slice(&[0u8; ADDRESS_WIDTH]);
    }

    pub fn jump(&mut self, name: &str) {
        self.push_label(name);
        self.op(Opcode::Jump);
    }

    pub fn jump_if(&mut self, name: &str) {
        self.push_label(name);
        self.op(Opcode::JumpI);
    }

    /// `JUMP` to whatever address is on top of the stack
    pub fn jump_indirect(&mut self) {
        self.op(Opcode::Jump);
    }

    /// Patch every placeholder with its label offset and freeze the program
    pub fn resolve(self) -> Result<Program> {
        let Assembler {
            mut code,
            labels,
            references,
            ..
        } = self;

        for reference in &references {
            let target = *labels
                .get(&reference.label)
                .ok_or_else(|| AssemblerError::UnresolvedLabel(reference.label.clone()))?;
            let bytes = encode_word(&BigUint::from(target), ADDRESS_WIDTH).map_err(|_| {
                AssemblerError::LabelOutOfRange {
                    label: reference.label.clone(),
                    offset: target,
                    width: ADDRESS_WIDTH,
                }
            })?;
            code[reference.offset..reference.offset + ADDRESS_WIDTH].copy_from_slice(&bytes);
        }

        debug!(
            size = code.len(),
            labels = labels.len(),
            references = references.len(),
            "resolved program"
        );

        Ok(Program::with_labels(code, labels))
    }
}
