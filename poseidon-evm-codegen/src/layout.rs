//! Scratch memory layout
//!
//! Byte offsets of 32-byte cells:
//!
//! | cell                         | content                         |
//! |------------------------------|---------------------------------|
//! | `0`                          | return address, later the digest |
//! | `1 + i*t + j`                | `M[i][j]`                       |
//! | `1 + t*t + i*t + j`          | `P[i][j]` (transition matrix)   |
//! | `1 + 2*t*t + j`              | spilled state element `j`       |

use poseidon_evm_spec::WORD_SIZE;

/// Cell read by the return sequence of the mix subroutine
pub const RETURN_ADDRESS_CELL: usize = 0;

/// Which matrix a dense mix reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSlot {
    Mds,
    Transition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchLayout {
    width: usize,
}

impl ScratchLayout {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    fn cell(index: usize) -> usize {
        index * WORD_SIZE
    }

    pub fn matrix_cell(&self, slot: MatrixSlot, i: usize, j: usize) -> usize {
        let t = self.width;
        let base = match slot {
            MatrixSlot::Mds => 1,
            MatrixSlot::Transition => 1 + t * t,
        };
        Self::cell(base + i * t + j)
    }

    pub fn spill_cell(&self, j: usize) -> usize {
        Self::cell(1 + 2 * self.width * self.width + j)
    }

    /// Bytes of memory touched by the program
    pub fn size(&self) -> usize {
        self.spill_cell(self.width)
    }
}
