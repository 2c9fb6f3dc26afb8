//! Control-flow analysis
//!
//! Every static jump emitted by the assembler has the shape `PUSHn target; JUMP|JUMPI`.
//! Collecting those pairs lets tests check that each target lands on a real `JUMPDEST`.

use crate::decoder::decode;
use crate::error::Result;
use num_bigint::BigUint;
use poseidon_evm_spec::{jump_destinations, Opcode};

/// A static jump found in the code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTarget {
    /// Offset of the `JUMP`/`JUMPI` instruction
    pub offset: usize,
    /// Pushed destination
    pub target: BigUint,
    pub conditional: bool,
}

/// All static jumps, in code order
pub fn jump_targets(code: &[u8]) -> Result<Vec<JumpTarget>> {
    let decoded = decode(code)?;
    let mut out = Vec::new();

    for pair in decoded.windows(2) {
        let (push, jump) = (&pair[0], &pair[1]);
        let conditional = match jump.instruction.opcode {
            Opcode::Jump => false,
            Opcode::JumpI => true,
            _ => continue,
        };
        if let (Opcode::Push(_), Some(target)) =
            (push.instruction.opcode, push.instruction.immediate_value())
        {
            out.push(JumpTarget {
                offset: jump.offset,
                target,
                conditional,
            });
        }
    }

    Ok(out)
}

/// Static jumps whose target is not a valid `JUMPDEST`
pub fn invalid_jump_targets(code: &[u8]) -> Result<Vec<JumpTarget>> {
    let dests = jump_destinations(code);
    Ok(jump_targets(code)?
        .into_iter()
        .filter(|jump| {
            usize::try_from(&jump.target)
                .map(|target| !dests.contains(&target))
                .unwrap_or(true)
        })
        .collect())
}

/// Number of `JUMP`/`JUMPI` with no immediately preceding push (return-address jumps)
pub fn indirect_jump_count(code: &[u8]) -> Result<usize> {
    let decoded = decode(code)?;
    let mut count = 0;
    for (i, d) in decoded.iter().enumerate() {
        if !matches!(d.instruction.opcode, Opcode::Jump | Opcode::JumpI) {
            continue;
        }
        let preceded_by_push = i > 0 && matches!(decoded[i - 1].instruction.opcode, Opcode::Push(_));
        if !preceded_by_push {
            count += 1;
        }
    }
    Ok(count)
}
