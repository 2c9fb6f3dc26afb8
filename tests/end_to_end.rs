//! End-to-end tests for the Poseidon EVM toolchain
//!
//! These tests verify the complete workflow:
//! 1. Generate a program for a number of inputs
//! 2. Deploy its creation code and obtain the runtime code
//! 3. Call the runtime code with ABI-encoded inputs
//! 4. Compare the digest with the direct evaluation
//! 5. Disassemble the program and check its control flow

use poseidon_evm_codegen::reference;
use poseidon_evm_codegen::{generate, ArgEncoding, AssembledProgram, CodegenError};
use poseidon_evm_disassembler::{
    disassemble, indirect_jump_count, invalid_jump_targets, jump_targets,
};
use poseidon_evm_runtime::{call, deploy, HaltReason, VMConfig, VM};
use poseidon_evm_spec::{Fr, MAX_CODE_SIZE};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn inputs(n: usize, seed: u64) -> Vec<Fr> {
    (0..n as u64).map(|i| Fr::from_u64(seed * 1000 + i)).collect()
}

fn digest_of(code: &[u8], calldata: &[u8]) -> Fr {
    let result = call(code, calldata).expect("execution failed");
    assert_eq!(result.halt_reason, HaltReason::Return);
    Fr::from_canonical(result.return_word().expect("one return word")).expect("digest not reduced")
}

fn deployed(program: &AssembledProgram) -> Vec<u8> {
    let creation = program.creation_code().expect("creation code");
    deploy(&creation).expect("deployment failed")
}

// ============================================================================
// Generate -> Deploy -> Call
// ============================================================================

#[test]
fn test_golden_vector_through_deployment() {
    init_tracing();
    let program = generate(2).expect("generation failed");
    let runtime = deployed(&program);
    assert_eq!(runtime, program.code());

    let calldata = program
        .calldata(ArgEncoding::Uint256, &[Fr::from_u64(1), Fr::from_u64(2)])
        .expect("calldata failed");
    assert_eq!(
        digest_of(&runtime, &calldata).to_hex(),
        "0x115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a"
    );
}

#[test]
fn test_all_widths_deploy_and_match_reference() {
    init_tracing();
    for n in 1..=8 {
        let program = generate(n).expect("generation failed");
        let runtime = deployed(&program);
        let values = inputs(n, n as u64);
        let calldata = program
            .calldata(ArgEncoding::Bytes32, &values)
            .expect("calldata failed");
        assert_eq!(
            digest_of(&runtime, &calldata),
            reference::hash(&values).expect("reference failed"),
            "{} inputs",
            n
        );
    }
}

#[test]
fn test_both_selectors_accepted() {
    for n in [1, 5, 8] {
        let program = generate(n).expect("generation failed");
        let values = inputs(n, 7);
        let uint = program.calldata(ArgEncoding::Uint256, &values).unwrap();
        let bytes = program.calldata(ArgEncoding::Bytes32, &values).unwrap();
        assert_ne!(uint[..4], bytes[..4]);
        assert_eq!(uint[4..], bytes[4..]);
        assert_eq!(
            digest_of(program.code(), &uint),
            digest_of(program.code(), &bytes)
        );
    }
}

#[test]
fn test_unknown_selector_aborts() {
    let program = generate(2).expect("generation failed");
    let mut calldata = program
        .calldata(ArgEncoding::Uint256, &inputs(2, 1))
        .unwrap();

    for selector in [[0u8; 4], [0xa9, 0x05, 0x9c, 0xbb], [0xff; 4]] {
        calldata[..4].copy_from_slice(&selector);
        let result = call(program.code(), &calldata).expect("execution failed");
        assert_eq!(result.halt_reason, HaltReason::Invalid);
        assert!(result.return_data.is_empty());
        assert_eq!(result.return_word(), None);
    }

    // no calldata at all
    let result = call(program.code(), &[]).expect("execution failed");
    assert_eq!(result.halt_reason, HaltReason::Invalid);
}

#[test]
fn test_selector_of_other_width_aborts() {
    let two = generate(2).expect("generation failed");
    let three = generate(3).expect("generation failed");
    let calldata = three
        .calldata(ArgEncoding::Uint256, &inputs(3, 2))
        .unwrap();
    let result = call(two.code(), &calldata).expect("execution failed");
    assert_eq!(result.halt_reason, HaltReason::Invalid);
}

#[test]
fn test_trace_config_does_not_change_result() {
    init_tracing();
    let program = generate(1).expect("generation failed");
    let calldata = program
        .calldata(ArgEncoding::Uint256, &[Fr::from_u64(42)])
        .unwrap();

    let plain = call(program.code(), &calldata).expect("execution failed");
    let config = VMConfig {
        trace: true,
        ..VMConfig::default()
    };
    let traced = VM::from_program(&program.runtime, calldata, config)
        .run()
        .expect("execution failed");
    assert_eq!(plain, traced);
}

// ============================================================================
// Generation Properties
// ============================================================================

#[test]
fn test_generation_is_idempotent() {
    for n in [1, 4, 8] {
        let first = generate(n).expect("generation failed");
        let second = generate(n).expect("generation failed");
        assert_eq!(first.code(), second.code());
        assert_eq!(first.creation_code().unwrap(), second.creation_code().unwrap());
        assert_eq!(
            first.interface.to_json().unwrap(),
            second.interface.to_json().unwrap()
        );
    }
}

#[test]
fn test_boundary_widths() {
    assert!(generate(1).is_ok());
    assert!(generate(8).is_ok());
    assert!(matches!(
        generate(0),
        Err(CodegenError::UnsupportedWidth { inputs: 0 })
    ));
    assert!(matches!(
        generate(9),
        Err(CodegenError::UnsupportedWidth { inputs: 9 })
    ));
}

#[test]
fn test_labels_resolve_to_distinct_jumpdests() {
    for n in 1..=8 {
        let program = generate(n).expect("generation failed");
        let code = program.code();

        assert!(invalid_jump_targets(code).expect("decode failed").is_empty());
        // the only dynamic jump is the subroutine return
        assert_eq!(indirect_jump_count(code).expect("decode failed"), 1);

        let offsets: BTreeSet<usize> = program.runtime.labels.values().copied().collect();
        assert_eq!(offsets.len(), program.runtime.labels.len(), "{} inputs", n);
        for &offset in &offsets {
            assert!(offset < code.len());
            assert_eq!(code[offset], 0x5b);
        }

        // every static jump lands on a label
        for target in jump_targets(code).expect("decode failed") {
            let target: usize = target.target.try_into().expect("target fits usize");
            assert!(offsets.contains(&target));
        }
    }
}

#[test]
fn test_code_size_report() {
    let small = generate(1).expect("generation failed");
    assert!(!small.exceeds_code_size_limit());
    assert!(small.code_size() <= MAX_CODE_SIZE);

    let large = generate(8).expect("generation failed");
    assert!(large.exceeds_code_size_limit());
    let report = large.size_report();
    assert!(report.exceeds_limit());
    assert_eq!(report.runtime_size, large.code_size());
    assert_eq!(report.creation_size, large.creation_code().unwrap().len());
}

#[test]
fn test_disassembly_names_labels() {
    let program = generate(1).expect("generation failed");
    let listing = disassemble(&program.runtime);
    assert!(listing.starts_with("; Poseidon EVM Disassembly"));
    assert!(listing.contains("start:"));
    assert!(listing.contains("mix:"));
    assert!(listing.contains("mix_return_0:"));
    assert!(listing.contains("MULMOD"));
    assert!(!listing.contains("; ERROR"));
}

#[test]
fn test_interface_descriptor_json() {
    let program = generate(3).expect("generation failed");
    let json: serde_json::Value =
        serde_json::from_str(&program.interface.to_json().unwrap()).unwrap();
    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert_eq!(entry["name"], "poseidon");
        assert_eq!(entry["stateMutability"], "pure");
        assert_eq!(entry["inputs"].as_array().unwrap().len(), 1);
        assert_eq!(entry["outputs"].as_array().unwrap().len(), 1);
    }
    assert_eq!(entries[1]["inputs"][0]["type"], "uint256[3]");
}

// ============================================================================
// Random Inputs
// ============================================================================

fn arb_fr() -> impl Strategy<Value = Fr> {
    any::<[u8; 32]>().prop_map(|b| Fr::from_bytes_be(&b))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn test_random_inputs_every_encoding(
        n in 1usize..=8,
        values in proptest::collection::vec(arb_fr(), 8),
    ) {
        let program = generate(n).expect("generation failed");
        let values = &values[..n];
        let expected = reference::hash(values).expect("reference failed");
        for encoding in ArgEncoding::ALL {
            let calldata = program.calldata(encoding, values).expect("calldata failed");
            prop_assert_eq!(digest_of(program.code(), &calldata), expected.clone());
        }
    }
}
