//! # Stack-Position Calculus
//!
//! The generated program keeps the permutation state on the stack:
//!
//! ```text
//! top -> st_0
//!        st_1
//!        ..
//!        st_{t-1}
//!        q          (field modulus, depth t)
//! ```
//!
//! Every motif temporarily pushes values on top of this shape. All offsets are
//! computed from the number of such values (`above`), so each formula reads as
//! "element i with `above` extra items on top". Depths are zero-based, matching
//! [`Assembler::dup`](poseidon_evm_assembler::Assembler::dup) and `swap`.

use poseidon_evm_spec::{MAX_DUP_DEPTH, MAX_SWAP_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLayout {
    width: usize,
}

impl StackLayout {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Live items of the resting shape: t state elements plus the modulus
    pub fn resting_height(&self) -> usize {
        self.width + 1
    }

    /// Depth of state element `i`
    pub fn element(&self, i: usize, above: usize) -> usize {
        above + i
    }

    /// Depth of the field modulus
    pub fn modulus(&self, above: usize) -> usize {
        above + self.width
    }

    /// Depth of the modulus once the state has been spilled to memory
    pub fn spilled_modulus(&self, above: usize) -> usize {
        above
    }

    /// `swap` depth that moves the oldest old-state copy into place during the
    /// stack-resident compaction of the dense mix (step `i` of t)
    ///
    /// Before step i the stack holds `t - i` new rows (newest on top, rows `i..t`
    /// still in reverse order) above `t - i` stale elements.
    pub fn compaction_swap(&self, i: usize) -> usize {
        2 * (self.width - i) - 1
    }

    /// Deepest `dup` issued by the stack-resident dense mix
    ///
    /// Reached when accumulating the last column of the last row: t - 1 finished
    /// rows, the accumulator, the product and the loaded entry sit above element
    /// t - 1.
    pub fn max_dense_mix_depth(&self) -> usize {
        let rows_above = self.width - 1;
        self.element(self.width - 1, rows_above + 3)
            .max(self.modulus(rows_above + 2))
    }

    /// Deepest `dup` issued by the memory-spilled dense mix
    pub fn max_spilled_mix_depth(&self) -> usize {
        self.spilled_modulus(self.width - 1 + 2)
    }

    /// Deepest `dup` issued by a partial round
    pub fn max_partial_round_depth(&self) -> usize {
        self.modulus(3)
    }

    /// Whether the stack-resident dense mix stays within DUP/SWAP reach
    pub fn stack_resident_mix_fits(&self) -> bool {
        self.max_dense_mix_depth() <= MAX_DUP_DEPTH
            && self.compaction_swap(0) <= MAX_SWAP_DEPTH
    }
}
