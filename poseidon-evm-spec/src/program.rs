//! Program representation
//!
//! A `Program` is the sole output artifact of assembly: the resolved byte buffer plus
//! the label table it was resolved against (kept for listings and tests).

use crate::opcode::Opcode;
use crate::MAX_CODE_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Resolved bytecode
    pub code: Vec<u8>,

    /// Label name -> byte offset of its `JUMPDEST`
    pub labels: BTreeMap<String, usize>,
}

impl Program {
    /// Program without label information
    pub fn new(code: Vec<u8>) -> Self {
        Self {
            code,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_labels(code: Vec<u8>, labels: BTreeMap<String, usize>) -> Self {
        Self { code, labels }
    }

    /// Code size in bytes
    pub fn size(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Whether the code would be rejected by a chain enforcing the deployed-code limit
    pub fn exceeds_code_size_limit(&self) -> bool {
        self.code.len() > MAX_CODE_SIZE
    }

    /// Offset bound to `name`
    pub fn label_offset(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Labels bound at `offset`, in name order
    pub fn labels_at(&self, offset: usize) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|(_, &at)| at == offset)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Lowercase hex without prefix
    pub fn to_hex(&self) -> String {
        self.code.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Offsets of every `JUMPDEST` that is not part of push data
pub fn jump_destinations(code: &[u8]) -> BTreeSet<usize> {
    let mut dests = BTreeSet::new();
    let mut pc = 0;
    while pc < code.len() {
        match Opcode::from_u8(code[pc]) {
            Some(Opcode::JumpDest) => {
                dests.insert(pc);
                pc += 1;
            }
            Some(op) => pc += 1 + op.immediate_size(),
            None => pc += 1,
        }
    }
    dests
}
