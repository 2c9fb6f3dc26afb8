//! # Subroutine Emulation
//!
//! The machine has no call stack. A call stores a call-site return label in the
//! return-address cell and jumps to the routine; the routine ends by loading the
//! cell and jumping to whatever it holds. Calls never nest, so one cell suffices.
//!
//! The store into the cell is the last thing before the jump, and nothing else
//! reads the cell.

use crate::error::Result;
use crate::layout::RETURN_ADDRESS_CELL;
use crate::motif::{self, StackOp};
use poseidon_evm_assembler::Assembler;

/// Entry label of the shared dense-mix routine
pub const MIX_LABEL: &str = "mix";

/// Prefix of the per-call-site return labels
pub const RETURN_LABEL_PREFIX: &str = "mix_return";

/// Call `target` and bind a fresh return label right after the jump
///
/// Returns the name of the return label.
pub fn emit_call(asm: &mut Assembler, target: &str) -> Result<String> {
    let return_label = asm.fresh_label(RETURN_LABEL_PREFIX);
    asm.push_label(&return_label);
    asm.push_u64(RETURN_ADDRESS_CELL as u64);
    asm.mstore();
    asm.jump(target);
    asm.label(&return_label)?;
    Ok(return_label)
}

/// Indirect jump through the return-address cell
pub fn emit_return(asm: &mut Assembler) {
    asm.push_u64(RETURN_ADDRESS_CELL as u64);
    asm.mload();
    asm.jump_indirect();
}

/// Routine `name` running `body` and returning to its caller
pub fn emit_subroutine(asm: &mut Assembler, name: &str, body: &[StackOp]) -> Result<()> {
    asm.label(name)?;
    motif::emit(asm, body)?;
    emit_return(asm);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodegenError;
    use poseidon_evm_assembler::AssemblerError;

    #[test]
    fn test_call_sequence() {
        let mut asm = Assembler::new();
        let ret = emit_call(&mut asm, MIX_LABEL).unwrap();
        assert_eq!(ret, "mix_return_0");
        // PUSH3 ret, PUSH1 0, MSTORE, PUSH3 mix, JUMP, JUMPDEST
        assert_eq!(asm.len(), 4 + 2 + 1 + 4 + 1 + 1);
        assert_eq!(asm.label_offset(&ret), Some(12));
        assert_eq!(asm.code()[6], 0x52);
        assert_eq!(asm.code()[11], 0x56);
        assert_eq!(asm.code()[12], 0x5b);

        let labels: Vec<&str> = asm
            .pending_references()
            .iter()
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["mix_return_0", "mix"]);
    }

    #[test]
    fn test_call_sites_get_distinct_labels() {
        let mut asm = Assembler::new();
        let first = emit_call(&mut asm, MIX_LABEL).unwrap();
        let second = emit_call(&mut asm, MIX_LABEL).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_subroutine_resolves() {
        let mut asm = Assembler::new();
        let ret = emit_call(&mut asm, MIX_LABEL).unwrap();
        asm.stop();
        emit_subroutine(&mut asm, MIX_LABEL, &[StackOp::Dup(0), StackOp::Pop]).unwrap();

        let program = asm.resolve().unwrap();
        let entry = program.label_offset(MIX_LABEL).unwrap();
        assert_eq!(program.code[entry], 0x5b);
        // JUMPDEST DUP1 POP PUSH1 0 MLOAD JUMP
        assert_eq!(
            &program.code[entry..],
            &[0x5b, 0x80, 0x50, 0x60, 0x00, 0x51, 0x56]
        );
        assert_eq!(program.label_offset(&ret), Some(12));
    }

    #[test]
    fn test_subroutine_defined_twice() {
        let mut asm = Assembler::new();
        emit_subroutine(&mut asm, MIX_LABEL, &[]).unwrap();
        assert!(matches!(
            emit_subroutine(&mut asm, MIX_LABEL, &[]),
            Err(CodegenError::Assembler(AssemblerError::DuplicateLabel(_)))
        ));
    }
}
