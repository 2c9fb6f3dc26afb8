//! Direct evaluation of the permutation
//!
//! Two independent evaluators: [`permute`] runs the textbook round schedule, and
//! [`permute_optimized`] runs the schedule the generated program follows over the
//! optimized tables. Both serve as oracles for the bytecode.

use crate::constants::{OptimizedConstants, ReferenceConstants};
use crate::error::{CodegenError, Result};
use crate::params::PoseidonParams;
use poseidon_evm_spec::Fr;

const SBOX_EXPONENT: u64 = 5;

fn check_state(params: &PoseidonParams, state: &[Fr]) -> Result<()> {
    if state.len() != params.width {
        return Err(CodegenError::StateLength {
            expected: params.width,
            actual: state.len(),
        });
    }
    Ok(())
}

fn sbox(x: &mut Fr) {
    *x = x.pow(SBOX_EXPONENT);
}

fn add_assign(state: &mut [Fr], constants: &[Fr]) {
    for (x, c) in state.iter_mut().zip(constants) {
        *x = &*x + c;
    }
}

/// Textbook schedule: add constants, S-box (all or first), dense mix
pub fn permute(
    params: &PoseidonParams,
    constants: &ReferenceConstants,
    state: &[Fr],
) -> Result<Vec<Fr>> {
    check_state(params, state)?;
    constants.validate(params)?;

    let rf = params.half_full_rounds();
    let mut state = state.to_vec();
    for round in 0..params.total_rounds() {
        add_assign(&mut state, constants.round(params, round));
        if round < rf || round >= rf + params.partial_rounds {
            state.iter_mut().for_each(sbox);
        } else {
            sbox(&mut state[0]);
        }
        state = constants.mds.mul_vec(&state);
    }
    Ok(state)
}

/// Optimized schedule, step for step what the generated program computes
pub fn permute_optimized(
    params: &PoseidonParams,
    constants: &OptimizedConstants,
    state: &[Fr],
) -> Result<Vec<Fr>> {
    check_state(params, state)?;
    constants.validate(params)?;

    let rf = params.half_full_rounds();
    let mut state = state.to_vec();

    add_assign(&mut state, constants.first_half(params, 0));
    for round in 0..rf - 1 {
        state.iter_mut().for_each(sbox);
        add_assign(&mut state, constants.first_half(params, round + 1));
        state = constants.mds.mul_vec(&state);
    }

    // transitional round
    state.iter_mut().for_each(sbox);
    add_assign(&mut state, constants.first_half(params, rf));
    state = constants.transition.mul_vec(&state);

    for (round, sparse) in constants.sparse.iter().enumerate() {
        sbox(&mut state[0]);
        state[0] = &state[0] + constants.partial(params, round);
        sparse.apply(&mut state)?;
    }

    for round in 0..rf - 1 {
        state.iter_mut().for_each(sbox);
        add_assign(&mut state, constants.second_half(params, round));
        state = constants.mds.mul_vec(&state);
    }

    state.iter_mut().for_each(sbox);
    Ok(constants.mds.mul_vec(&state))
}

/// Poseidon hash of 1..=8 inputs: first element of the permutation of `[0, inputs..]`
pub fn hash(inputs: &[Fr]) -> Result<Fr> {
    let params = PoseidonParams::for_inputs(inputs.len())?;
    let constants = ReferenceConstants::generate(&params);

    let mut state = Vec::with_capacity(params.width);
    state.push(Fr::zero());
    state.extend_from_slice(inputs);

    let out = permute(&params, &constants, &state)?;
    Ok(out[0].clone())
}
