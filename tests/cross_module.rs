//! Cross-module interaction tests
//!
//! Tests the integration between assembler, disassembler, runtime and the
//! code generator's building blocks.

use num_bigint::BigUint;
use poseidon_evm_assembler::Assembler;
use poseidon_evm_codegen::layout::{MatrixSlot, ScratchLayout};
use poseidon_evm_codegen::motif::{self, StackOp};
use poseidon_evm_codegen::stack::StackLayout;
use poseidon_evm_codegen::subroutine::{self, MIX_LABEL};
use poseidon_evm_codegen::{Matrix, SparseMatrix};
use poseidon_evm_disassembler::{decode, disassemble, format};
use poseidon_evm_runtime::{call, HaltReason};
use poseidon_evm_spec::{Fr, Opcode, MAX_PUSH_WIDTH};

/// Program that pushes the modulus and `state`, runs `body`, and returns the
/// resulting state as consecutive words
fn harness(state: &[Fr], setup: impl FnOnce(&mut Assembler), body: &[StackOp]) -> Vec<u8> {
    let mut asm = Assembler::new();
    setup(&mut asm);
    asm.push_fixed(Fr::modulus(), MAX_PUSH_WIDTH).unwrap();
    for x in state.iter().rev() {
        asm.push_word(x);
    }
    motif::emit(&mut asm, body).unwrap();
    for i in 0..state.len() {
        asm.push_u64((i * 32) as u64);
        asm.mstore();
    }
    asm.push_u64((state.len() * 32) as u64);
    asm.push_u64(0);
    asm.ret();
    asm.resolve().unwrap().code
}

fn run_state(code: &[u8], width: usize) -> Vec<Fr> {
    let result = call(code, &[]).expect("execution failed");
    assert_eq!(result.halt_reason, HaltReason::Return);
    assert_eq!(result.return_data.len(), width * 32);
    result
        .return_data
        .chunks(32)
        .map(|word| Fr::from_canonical(BigUint::from_bytes_be(word)).expect("unreduced"))
        .collect()
}

fn store_matrix(asm: &mut Assembler, scratch: &ScratchLayout, slot: MatrixSlot, m: &Matrix) {
    for i in 0..m.num_rows() {
        for j in 0..m.num_cols() {
            asm.push_word(&m[(i, j)]);
            asm.push_u64(scratch.matrix_cell(slot, i, j) as u64);
            asm.mstore();
        }
    }
}

fn sample_state(width: usize) -> Vec<Fr> {
    (0..width as u64).map(|i| -Fr::from_u64(i * 13 + 5)).collect()
}

fn sample_matrix(width: usize) -> Matrix {
    let rows = (0..width as u64)
        .map(|i| {
            (0..width as u64)
                .map(|j| Fr::from_u64(i + j + 1).inverse().unwrap())
                .collect()
        })
        .collect();
    Matrix::from_rows(rows).unwrap()
}

// ============================================================================
// Motifs -> Assembler -> Runtime
// ============================================================================

#[test]
fn test_ark_and_sigma_on_vm() {
    let width = 4;
    let layout = StackLayout::new(width);
    let state = sample_state(width);
    let constants: Vec<Fr> = (1..=width as u64).map(Fr::from_u64).collect();

    let mut body = motif::ark(&layout, &constants);
    body.extend(motif::sigma_all(&layout));
    let code = harness(&state, |_| {}, &body);

    let expected: Vec<Fr> = state
        .iter()
        .zip(&constants)
        .map(|(x, c)| (x + c).pow(5))
        .collect();
    assert_eq!(run_state(&code, width), expected);
}

#[test]
fn test_dense_mixes_on_vm() {
    for width in [2, 5, 7, 9] {
        let layout = StackLayout::new(width);
        let scratch = ScratchLayout::new(width);
        let m = sample_matrix(width);
        let state = sample_state(width);
        let expected = m.mul_vec(&state);

        let spilled = motif::dense_mix_spilled(&layout, &scratch, MatrixSlot::Transition);
        let code = harness(
            &state,
            |asm| store_matrix(asm, &scratch, MatrixSlot::Transition, &m),
            &spilled,
        );
        assert_eq!(run_state(&code, width), expected, "spilled t={}", width);

        if layout.stack_resident_mix_fits() {
            let resident = motif::dense_mix_stack(&layout, &scratch, MatrixSlot::Mds);
            let code = harness(
                &state,
                |asm| store_matrix(asm, &scratch, MatrixSlot::Mds, &m),
                &resident,
            );
            assert_eq!(run_state(&code, width), expected, "resident t={}", width);
        }
    }
}

#[test]
fn test_partial_round_on_vm() {
    let width = 3;
    let layout = StackLayout::new(width);
    let sparse = SparseMatrix::new((10..15).map(Fr::from_u64).collect()).unwrap();
    let state = sample_state(width);
    let constant = Fr::from_u64(99);

    let mut expected = state.clone();
    expected[0] = &expected[0].pow(5) + &constant;
    sparse.apply(&mut expected).unwrap();

    let code = harness(&state, |_| {}, &motif::partial_round(&layout, &constant, &sparse));
    assert_eq!(run_state(&code, width), expected);
}

#[test]
fn test_subroutine_called_twice() {
    // Two calls into a routine that doubles st_0, then return st_0
    let width = 2;
    let layout = StackLayout::new(width);
    let double = vec![
        StackOp::Dup(layout.modulus(0)),
        StackOp::Dup(layout.element(0, 1)),
        StackOp::Dup(layout.element(0, 2)),
        StackOp::AddMod,
        StackOp::Swap(layout.element(0, 1)),
        StackOp::Pop,
    ];

    let mut asm = Assembler::new();
    asm.push_fixed(Fr::modulus(), MAX_PUSH_WIDTH).unwrap();
    asm.push_u64(0);
    asm.push_u64(3);
    subroutine::emit_call(&mut asm, MIX_LABEL).unwrap();
    subroutine::emit_call(&mut asm, MIX_LABEL).unwrap();
    asm.push_u64(0);
    asm.mstore();
    asm.push_u64(32);
    asm.push_u64(0);
    asm.ret();
    subroutine::emit_subroutine(&mut asm, MIX_LABEL, &double).unwrap();
    let program = asm.resolve().unwrap();

    let result = call(&program.code, &[]).expect("execution failed");
    assert_eq!(result.return_word(), Some(BigUint::from(12u32)));
}

// ============================================================================
// Assembler -> Disassembler
// ============================================================================

#[test]
fn test_decode_matches_emission() {
    let width = 3;
    let layout = StackLayout::new(width);
    let mut asm = Assembler::new();
    let ops = motif::sigma(&layout, 2);
    motif::emit(&mut asm, &ops).unwrap();
    let program = asm.resolve().unwrap();

    let decoded = decode(&program.code).unwrap();
    assert_eq!(decoded.len(), ops.len());
    let mnemonics: Vec<String> = decoded.iter().map(|d| format(&d.instruction)).collect();
    assert_eq!(
        mnemonics,
        vec![
            "DUP4", "DUP4", "DUP2", "DUP1", "DUP3", "DUP1", "MULMOD", "DUP1", "MULMOD", "MULMOD",
            "SWAP3", "POP"
        ]
    );
}

#[test]
fn test_constant_push_disassembles_as_push32() {
    let mut asm = Assembler::new();
    let layout = StackLayout::new(2);
    motif::emit(&mut asm, &motif::add_constant(&layout, 1, &Fr::from_u64(7))).unwrap();
    let program = asm.resolve().unwrap();

    let decoded = decode(&program.code).unwrap();
    assert_eq!(decoded[1].instruction.opcode, Opcode::Push(32));
    assert_eq!(
        decoded[1].instruction.immediate_value(),
        Some(BigUint::from(7u32))
    );

    let listing = disassemble(&program);
    assert!(listing.contains("ADDMOD"));
    assert!(listing.contains("PUSH32 0x"));
}

#[test]
fn test_call_listing_shows_return_label() {
    let mut asm = Assembler::new();
    subroutine::emit_call(&mut asm, MIX_LABEL).unwrap();
    asm.stop();
    subroutine::emit_subroutine(&mut asm, MIX_LABEL, &[]).unwrap();
    let program = asm.resolve().unwrap();

    let listing = disassemble(&program);
    let ret = listing.find("mix_return_0:").unwrap();
    let entry = listing.find("mix:").unwrap();
    assert!(ret < entry);
    assert!(listing.contains("JUMPDEST"));
}
