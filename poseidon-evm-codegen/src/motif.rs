//! # Round Motifs
//!
//! The four repeating pieces of the permutation, expressed as abstract stack
//! operations. Each motif starts and ends in the resting shape described in
//! [`crate::stack`]; every depth it uses comes from [`StackLayout`]. Keeping the
//! sequences separate from emission lets them be checked against the field
//! arithmetic directly (see the tests below) before they are lowered with [`emit`].

use crate::error::Result;
use crate::layout::{MatrixSlot, ScratchLayout};
use crate::params::MixStrategy;
use crate::sparse::SparseMatrix;
use crate::stack::StackLayout;
use poseidon_evm_assembler::Assembler;
use poseidon_evm_spec::Fr;

/// One instruction of a motif
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackOp {
    /// Zero-based depth
    Dup(usize),
    Swap(usize),
    Pop,
    /// Field constant, always PUSH32
    PushConstant(Fr),
    /// Memory offset, narrowest push
    PushOffset(usize),
    AddMod,
    MulMod,
    MLoad,
    MStore,
}

impl StackOp {
    /// Net change of the stack height
    pub fn height_delta(&self) -> isize {
        match self {
            StackOp::Dup(_) | StackOp::PushConstant(_) | StackOp::PushOffset(_) => 1,
            StackOp::Swap(_) | StackOp::MLoad => 0,
            StackOp::Pop => -1,
            StackOp::AddMod | StackOp::MulMod => -2,
            StackOp::MStore => -2,
        }
    }

    fn lower(&self, asm: &mut Assembler) -> Result<()> {
        match self {
            StackOp::Dup(depth) => asm.dup(*depth)?,
            StackOp::Swap(depth) => asm.swap(*depth)?,
            StackOp::Pop => asm.pop(),
            StackOp::PushConstant(value) => asm.push_word(value),
            StackOp::PushOffset(offset) => asm.push_u64(*offset as u64),
            StackOp::AddMod => asm.add_mod(),
            StackOp::MulMod => asm.mul_mod(),
            StackOp::MLoad => asm.mload(),
            StackOp::MStore => asm.mstore(),
        }
        Ok(())
    }
}

/// Lower a motif into the assembler
pub fn emit(asm: &mut Assembler, ops: &[StackOp]) -> Result<()> {
    ops.iter().try_for_each(|op| op.lower(asm))
}

/// `st_i <- st_i + c mod q`
pub fn add_constant(layout: &StackLayout, i: usize, constant: &Fr) -> Vec<StackOp> {
    vec![
        StackOp::Dup(layout.modulus(0)),
        StackOp::PushConstant(constant.clone()),
        StackOp::Dup(layout.element(i, 2)),
        StackOp::AddMod,
        StackOp::Swap(layout.element(i, 1)),
        StackOp::Pop,
    ]
}

/// Round-constant addition over the whole state
pub fn ark(layout: &StackLayout, constants: &[Fr]) -> Vec<StackOp> {
    constants
        .iter()
        .enumerate()
        .flat_map(|(i, c)| add_constant(layout, i, c))
        .collect()
}

/// `st_p <- st_p^5 mod q`
pub fn sigma(layout: &StackLayout, p: usize) -> Vec<StackOp> {
    vec![
        StackOp::Dup(layout.modulus(0)),
        StackOp::Dup(layout.element(p, 1)),
        // q x q -> x q q x q -> x x q q x q
        StackOp::Dup(1),
        StackOp::Dup(0),
        StackOp::Dup(2),
        StackOp::Dup(0),
        StackOp::MulMod,
        StackOp::Dup(0),
        StackOp::MulMod,
        StackOp::MulMod,
        StackOp::Swap(layout.element(p, 1)),
        StackOp::Pop,
    ]
}

/// S-box on every element
pub fn sigma_all(layout: &StackLayout) -> Vec<StackOp> {
    (0..layout.width()).flat_map(|p| sigma(layout, p)).collect()
}

/// Dense `st <- A * st` keeping the old state on the stack
///
/// New rows accumulate on top of the old state in order 0..t, then the stale
/// copies are swapped out from the bottom up.
pub fn dense_mix_stack(layout: &StackLayout, scratch: &ScratchLayout, slot: MatrixSlot) -> Vec<StackOp> {
    let t = layout.width();
    let mut ops = Vec::new();

    for i in 0..t {
        // i finished rows above the old state
        for j in 0..t {
            let entry = StackOp::PushOffset(scratch.matrix_cell(slot, i, j));
            if j == 0 {
                ops.extend([
                    StackOp::Dup(layout.modulus(i)),
                    entry,
                    StackOp::MLoad,
                    StackOp::Dup(layout.element(j, i + 2)),
                    StackOp::MulMod,
                ]);
            } else {
                ops.extend([
                    StackOp::Dup(layout.modulus(i + 1)),
                    entry,
                    StackOp::MLoad,
                    StackOp::Dup(layout.element(j, i + 3)),
                    StackOp::MulMod,
                    StackOp::Dup(layout.modulus(i + 2)),
                    StackOp::Swap(2),
                    StackOp::AddMod,
                ]);
            }
        }
    }

    for i in 0..t {
        ops.push(StackOp::Swap(layout.compaction_swap(i)));
        ops.push(StackOp::Pop);
    }
    ops
}

/// Dense `st <- A * st` reading the old state back from the spill cells
///
/// Rows are produced last first so they end up in order without compaction.
pub fn dense_mix_spilled(layout: &StackLayout, scratch: &ScratchLayout, slot: MatrixSlot) -> Vec<StackOp> {
    let t = layout.width();
    let mut ops = Vec::new();

    for j in 0..t {
        ops.push(StackOp::PushOffset(scratch.spill_cell(j)));
        ops.push(StackOp::MStore);
    }

    for i in (0..t).rev() {
        let above = t - 1 - i;
        for j in 0..t {
            let entry = StackOp::PushOffset(scratch.matrix_cell(slot, i, j));
            let old = StackOp::PushOffset(scratch.spill_cell(j));
            if j == 0 {
                ops.extend([
                    StackOp::Dup(layout.spilled_modulus(above)),
                    entry,
                    StackOp::MLoad,
                    old,
                    StackOp::MLoad,
                    StackOp::MulMod,
                ]);
            } else {
                ops.extend([
                    StackOp::Dup(layout.spilled_modulus(above + 1)),
                    entry,
                    StackOp::MLoad,
                    old,
                    StackOp::MLoad,
                    StackOp::MulMod,
                    StackOp::Dup(layout.spilled_modulus(above + 2)),
                    StackOp::Swap(2),
                    StackOp::AddMod,
                ]);
            }
        }
    }
    ops
}

/// Dense mix in the given (resolved) strategy
pub fn dense_mix(
    strategy: MixStrategy,
    layout: &StackLayout,
    scratch: &ScratchLayout,
    slot: MatrixSlot,
) -> Vec<StackOp> {
    match strategy {
        MixStrategy::MemorySpilled => dense_mix_spilled(layout, scratch, slot),
        MixStrategy::StackResident | MixStrategy::Auto => dense_mix_stack(layout, scratch, slot),
    }
}

/// Partial round: S-box and constant on element 0, then the sparse update
pub fn partial_round(layout: &StackLayout, constant: &Fr, sparse: &SparseMatrix) -> Vec<StackOp> {
    let t = layout.width();
    let mut ops = sigma(layout, 0);
    ops.extend(add_constant(layout, 0, constant));

    // new_0 = <row0, st>, accumulated above the state
    for j in 0..t {
        let coefficient = StackOp::PushConstant(sparse.row0(j).clone());
        if j == 0 {
            ops.extend([
                StackOp::Dup(layout.modulus(0)),
                coefficient,
                StackOp::Dup(layout.element(j, 2)),
                StackOp::MulMod,
            ]);
        } else {
            ops.extend([
                StackOp::Dup(layout.modulus(1)),
                coefficient,
                StackOp::Dup(layout.element(j, 3)),
                StackOp::MulMod,
                StackOp::Dup(layout.modulus(2)),
                StackOp::Swap(2),
                StackOp::AddMod,
            ]);
        }
    }

    // st_k += w_k * old st_0, with new_0 parked on top
    for k in 1..t {
        ops.extend([
            StackOp::Dup(layout.modulus(1)),
            StackOp::PushConstant(sparse.col0(k).clone()),
            StackOp::Dup(layout.element(0, 3)),
            StackOp::MulMod,
            StackOp::Dup(layout.element(k, 2)),
            StackOp::Dup(layout.modulus(3)),
            StackOp::Swap(2),
            StackOp::AddMod,
            StackOp::Swap(layout.element(k, 2)),
            StackOp::Pop,
        ]);
    }

    // replace old st_0 with new_0
    ops.push(StackOp::Swap(1));
    ops.push(StackOp::Pop);
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use proptest::prelude::*;
    use std::collections::HashMap;

    use crate::matrix::Matrix;

    /// Executes motifs over plain integers; the stack top is the last element
    #[derive(Default)]
    struct Machine {
        stack: Vec<BigUint>,
        memory: HashMap<usize, BigUint>,
    }

    impl Machine {
        /// Resting shape for `state`, modulus below it
        fn resting(state: &[Fr]) -> Self {
            let mut stack = vec![Fr::modulus().clone()];
            stack.extend(state.iter().rev().map(|x| x.as_biguint().clone()));
            Self {
                stack,
                memory: HashMap::new(),
            }
        }

        fn store_matrix(&mut self, scratch: &ScratchLayout, slot: MatrixSlot, m: &Matrix) {
            for i in 0..m.num_rows() {
                for j in 0..m.num_cols() {
                    self.memory
                        .insert(scratch.matrix_cell(slot, i, j), m[(i, j)].as_biguint().clone());
                }
            }
        }

        fn pop(&mut self) -> BigUint {
            self.stack.pop().unwrap()
        }

        fn run(&mut self, ops: &[StackOp]) {
            for op in ops {
                match op {
                    StackOp::Dup(d) => {
                        assert!(*d <= 15, "dup depth {}", d);
                        let v = self.stack[self.stack.len() - 1 - d].clone();
                        self.stack.push(v);
                    }
                    StackOp::Swap(d) => {
                        assert!((1..=16).contains(d), "swap depth {}", d);
                        let top = self.stack.len() - 1;
                        self.stack.swap(top, top - d);
                    }
                    StackOp::Pop => {
                        self.pop();
                    }
                    StackOp::PushConstant(c) => self.stack.push(c.as_biguint().clone()),
                    StackOp::PushOffset(o) => self.stack.push(BigUint::from(*o)),
                    StackOp::AddMod => {
                        let (a, b, n) = (self.pop(), self.pop(), self.pop());
                        self.stack.push((a + b) % n);
                    }
                    StackOp::MulMod => {
                        let (a, b, n) = (self.pop(), self.pop(), self.pop());
                        self.stack.push((a * b) % n);
                    }
                    StackOp::MLoad => {
                        let offset: usize = self.pop().try_into().unwrap();
                        let v = self.memory.get(&offset).cloned().unwrap_or_default();
                        self.stack.push(v);
                    }
                    StackOp::MStore => {
                        let offset: usize = self.pop().try_into().unwrap();
                        let v = self.pop();
                        self.memory.insert(offset, v);
                    }
                }
            }
        }

        /// State back out of the resting shape, checking the modulus is intact
        fn state(&self, width: usize) -> Vec<Fr> {
            assert_eq!(self.stack.len(), width + 1);
            assert_eq!(&self.stack[0], Fr::modulus());
            self.stack[1..]
                .iter()
                .rev()
                .map(|x| Fr::from_canonical(x.clone()).unwrap())
                .collect()
        }
    }

    fn fr(x: u64) -> Fr {
        Fr::from_u64(x)
    }

    fn state(width: usize) -> Vec<Fr> {
        (0..width as u64).map(|i| fr(i * 7 + 3)).collect()
    }

    fn matrix(width: usize, seed: u64) -> Matrix {
        let rows = (0..width as u64)
            .map(|i| (0..width as u64).map(|j| fr(seed + i * 31 + j * 17 + i * j)).collect())
            .collect();
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_height_delta_preserved_by_motifs() {
        let layout = StackLayout::new(4);
        let scratch = ScratchLayout::new(4);
        let sparse = SparseMatrix::new((1..=7).map(fr).collect()).unwrap();
        let motifs = [
            ark(&layout, &state(4)),
            sigma_all(&layout),
            dense_mix_stack(&layout, &scratch, MatrixSlot::Mds),
            dense_mix_spilled(&layout, &scratch, MatrixSlot::Transition),
            partial_round(&layout, &fr(5), &sparse),
        ];
        for ops in motifs {
            assert_eq!(ops.iter().map(StackOp::height_delta).sum::<isize>(), 0);
        }
    }

    #[test]
    fn test_ark() {
        let layout = StackLayout::new(3);
        let constants = vec![fr(1), fr(2), -fr(1)];
        let mut m = Machine::resting(&[fr(10), fr(20), fr(30)]);
        m.run(&ark(&layout, &constants));
        assert_eq!(m.state(3), vec![fr(11), fr(22), fr(29)]);
    }

    #[test]
    fn test_sigma_single_element() {
        let layout = StackLayout::new(3);
        let mut m = Machine::resting(&[fr(2), fr(3), fr(4)]);
        m.run(&sigma(&layout, 1));
        assert_eq!(m.state(3), vec![fr(2), fr(243), fr(4)]);
    }

    #[test]
    fn test_sigma_all_wraps_modulus() {
        let layout = StackLayout::new(2);
        let big = -fr(2);
        let mut m = Machine::resting(&[big.clone(), fr(3)]);
        m.run(&sigma_all(&layout));
        assert_eq!(m.state(2), vec![big.pow(5), fr(243)]);
    }

    #[test]
    fn test_dense_mix_stack_matches_matrix() {
        for width in 2..=7 {
            let layout = StackLayout::new(width);
            let scratch = ScratchLayout::new(width);
            let a = matrix(width, 5);
            let mut m = Machine::resting(&state(width));
            m.store_matrix(&scratch, MatrixSlot::Mds, &a);
            m.run(&dense_mix_stack(&layout, &scratch, MatrixSlot::Mds));
            assert_eq!(m.state(width), a.mul_vec(&state(width)), "t={}", width);
        }
    }

    #[test]
    fn test_dense_mix_spilled_matches_matrix() {
        for width in 2..=9 {
            let layout = StackLayout::new(width);
            let scratch = ScratchLayout::new(width);
            let a = matrix(width, 9);
            let mut m = Machine::resting(&state(width));
            m.store_matrix(&scratch, MatrixSlot::Transition, &a);
            m.run(&dense_mix_spilled(&layout, &scratch, MatrixSlot::Transition));
            assert_eq!(m.state(width), a.mul_vec(&state(width)), "t={}", width);
        }
    }

    #[test]
    fn test_dense_mix_reads_only_its_slot() {
        let layout = StackLayout::new(3);
        let scratch = ScratchLayout::new(3);
        let mut m = Machine::resting(&state(3));
        m.store_matrix(&scratch, MatrixSlot::Mds, &Matrix::identity(3));
        m.store_matrix(&scratch, MatrixSlot::Transition, &matrix(3, 1));
        m.run(&dense_mix(
            MixStrategy::StackResident,
            &layout,
            &scratch,
            MatrixSlot::Mds,
        ));
        assert_eq!(m.state(3), state(3));
    }

    #[test]
    fn test_partial_round_small() {
        // t = 2, sparse [m00, v1, w1] = [2, 3, 4], constant 1
        let layout = StackLayout::new(2);
        let sparse = SparseMatrix::new(vec![fr(2), fr(3), fr(4)]).unwrap();
        let mut m = Machine::resting(&[fr(2), fr(5)]);
        m.run(&partial_round(&layout, &fr(1), &sparse));
        // x0 = 2^5 + 1 = 33; new0 = 2*33 + 3*5 = 81; new1 = 5 + 4*33 = 137
        assert_eq!(m.state(2), vec![fr(81), fr(137)]);
    }

    fn arb_fr() -> impl Strategy<Value = Fr> {
        any::<[u8; 32]>().prop_map(|b| Fr::from_bytes_be(&b))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_partial_round_matches_sparse_apply(
            width in 2usize..=9,
            entries in proptest::collection::vec(arb_fr(), 17),
            input in proptest::collection::vec(arb_fr(), 9),
            constant in arb_fr(),
        ) {
            let layout = StackLayout::new(width);
            let sparse = SparseMatrix::new(entries[..2 * width - 1].to_vec()).unwrap();
            let mut expected = input[..width].to_vec();
            expected[0] = &expected[0].pow(5) + &constant;
            sparse.apply(&mut expected).unwrap();

            let mut m = Machine::resting(&input[..width]);
            m.run(&partial_round(&layout, &constant, &sparse));
            prop_assert_eq!(m.state(width), expected);
        }

        #[test]
        fn test_mix_strategies_agree(
            width in 2usize..=7,
            input in proptest::collection::vec(arb_fr(), 7),
        ) {
            let layout = StackLayout::new(width);
            let scratch = ScratchLayout::new(width);
            let a = matrix(width, 11);

            let mut stack = Machine::resting(&input[..width]);
            stack.store_matrix(&scratch, MatrixSlot::Mds, &a);
            stack.run(&dense_mix_stack(&layout, &scratch, MatrixSlot::Mds));

            let mut spilled = Machine::resting(&input[..width]);
            spilled.store_matrix(&scratch, MatrixSlot::Mds, &a);
            spilled.run(&dense_mix_spilled(&layout, &scratch, MatrixSlot::Mds));

            prop_assert_eq!(stack.state(width), spilled.state(width));
        }
    }

    #[test]
    fn test_emit_lowers_to_opcodes() {
        let layout = StackLayout::new(2);
        let mut asm = Assembler::new();
        emit(&mut asm, &sigma(&layout, 0)).unwrap();
        // DUP3 DUP2 DUP2 DUP1 DUP3 DUP1 MULMOD DUP1 MULMOD MULMOD SWAP1 POP
        assert_eq!(
            asm.code(),
            &[0x82, 0x81, 0x81, 0x80, 0x82, 0x80, 0x09, 0x80, 0x09, 0x09, 0x90, 0x50]
        );
    }

    #[test]
    fn test_emit_rejects_deep_dup() {
        let layout = StackLayout::new(8);
        let scratch = ScratchLayout::new(8);
        let mut asm = Assembler::new();
        assert!(emit(&mut asm, &dense_mix_stack(&layout, &scratch, MatrixSlot::Mds)).is_err());
    }
}
