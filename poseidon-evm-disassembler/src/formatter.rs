//! Instruction formatting to assembly text

use poseidon_evm_spec::Instruction;

/// Format instruction as assembly text, e.g. `PUSH3 0x0001f4` or `MULMOD`
pub fn format(instr: &Instruction) -> String {
    if instr.immediate.is_empty() {
        return instr.opcode.mnemonic();
    }
    format!("{} 0x{}", instr.opcode.mnemonic(), hex(&instr.immediate))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
