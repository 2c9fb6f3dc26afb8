//! Program listing

use crate::decoder::decode_at;
use crate::formatter::format;
use poseidon_evm_spec::Program;
use std::fmt::Write;

/// Disassemble a program into an annotated listing
///
/// Bound labels are printed on their own line before the instruction they mark.
/// Undecodable bytes are reported inline and skipped one byte at a time.
pub fn disassemble(program: &Program) -> String {
    let mut body = String::new();
    let mut count = 0usize;
    let mut offset = 0usize;

    while offset < program.code.len() {
        for name in program.labels_at(offset) {
            let _ = writeln!(body, "{}:", name);
        }

        match decode_at(&program.code, offset) {
            Ok(decoded) => {
                let _ = writeln!(body, "0x{:04X}:  {}", offset, format(&decoded.instruction));
                offset = decoded.next_offset();
                count += 1;
            }
            Err(e) => {
                let _ = writeln!(
                    body,
                    "0x{:04X}:  {:02X}  ; ERROR: {}",
                    offset, program.code[offset], e
                );
                offset += 1;
            }
        }
    }

    let mut output = String::new();
    output.push_str("; Poseidon EVM Disassembly\n");
    let _ = writeln!(
        output,
        "; Code size: {} bytes ({} instructions)",
        program.code.len(),
        count
    );
    let _ = writeln!(output, "; Labels: {}", program.labels.len());
    output.push('\n');
    output.push_str(&body);
    output
}
