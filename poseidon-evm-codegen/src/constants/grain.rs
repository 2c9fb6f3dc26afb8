//! Grain LFSR parameter generation
//!
//! Round constants and the Cauchy MDS matrix are derived from an 80-bit Grain LFSR
//! seeded with the permutation parameters, exactly as the Poseidon reference
//! parameter script does. For t = 3 this reproduces the widely deployed circomlib
//! tables.

use crate::matrix::Matrix;
use crate::params::PoseidonParams;
use num_bigint::BigUint;
use poseidon_evm_spec::Fr;
use std::collections::HashSet;

const STATE_BITS: u32 = 80;
const STATE_MASK: u128 = (1u128 << STATE_BITS) - 1;

/// Field type tag: prime field
const FIELD_PRIME: u128 = 1;
/// S-box tag: x^alpha with positive alpha
const SBOX_POWER: u128 = 0;
/// Field size in bits
const FIELD_BITS: usize = 254;
/// Clocks discarded after seeding
const WARMUP_CLOCKS: usize = 160;

/// Tap positions, counted from the oldest bit
const TAPS: [u32; 6] = [62, 51, 38, 23, 13, 0];

#[derive(Debug, Clone)]
pub struct GrainLfsr {
    /// Oldest bit is bit 79, newest is bit 0
    state: u128,
}

impl GrainLfsr {
    pub fn new(params: &PoseidonParams) -> Self {
        let fields: [(u128, u32); 6] = [
            (FIELD_PRIME, 2),
            (SBOX_POWER, 4),
            (FIELD_BITS as u128, 12),
            (params.width as u128, 12),
            (params.full_rounds as u128, 10),
            (params.partial_rounds as u128, 10),
        ];
        let mut state = 0u128;
        for (value, width) in fields {
            state = (state << width) | (value & ((1 << width) - 1));
        }
        state = (state << 30) | ((1 << 30) - 1);

        let mut lfsr = Self { state };
        for _ in 0..WARMUP_CLOCKS {
            lfsr.clock();
        }
        lfsr
    }

    fn bit(&self, index: u32) -> u128 {
        (self.state >> (STATE_BITS - 1 - index)) & 1
    }

    fn clock(&mut self) -> bool {
        let new_bit = TAPS.iter().fold(0, |acc, &tap| acc ^ self.bit(tap));
        self.state = ((self.state << 1) | new_bit) & STATE_MASK;
        new_bit == 1
    }

    /// Self-shrinking output: clock pairs until the first bit of a pair is set
    pub fn next_bit(&mut self) -> bool {
        loop {
            let keep = self.clock();
            let value = self.clock();
            if keep {
                return value;
            }
        }
    }

    /// Big-endian integer of `bits` output bits
    pub fn next_bits(&mut self, bits: usize) -> BigUint {
        let mut value = BigUint::default();
        for _ in 0..bits {
            value <<= 1;
            if self.next_bit() {
                value |= BigUint::from(1u32);
            }
        }
        value
    }

    /// Uniform field element by rejection sampling
    pub fn next_field_element(&mut self) -> Fr {
        loop {
            let candidate = self.next_bits(FIELD_BITS);
            if let Ok(fr) = Fr::from_canonical(candidate) {
                return fr;
            }
        }
    }
}

/// Round constants and MDS matrix for `params`
///
/// Returns `(constants, mds)` with `(R_F + R_P) * t` constants.
pub fn generate(params: &PoseidonParams) -> (Vec<Fr>, Matrix) {
    let mut lfsr = GrainLfsr::new(params);
    let t = params.width;

    let constants = (0..params.reference_constant_count())
        .map(|_| lfsr.next_field_element())
        .collect();

    // Cauchy matrix from 2t distinct samples; x_i + y_j is then never zero
    let samples = loop {
        let samples: Vec<Fr> = (0..2 * t)
            .map(|_| Fr::from_biguint(lfsr.next_bits(FIELD_BITS)))
            .collect();
        let distinct: HashSet<&Fr> = samples.iter().collect();
        if distinct.len() == 2 * t {
            break samples;
        }
    };
    let (xs, ys) = samples.split_at(t);

    let mds = Matrix::from_fn(t, |i, j| {
        (&xs[i] + &ys[j]).inverse().unwrap_or_else(Fr::zero)
    });

    (constants, mds)
}
