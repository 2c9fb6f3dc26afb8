//! 256-bit machine words
//!
//! Words are `BigUint` values kept below 2^256; wrapping arithmetic masks after
//! every operation.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::sync::OnceLock;

pub type Word = BigUint;

/// 2^256
pub fn word_modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| BigUint::one() << 256)
}

/// Reduce into the 256-bit range
pub fn wrap(value: BigUint) -> Word {
    if &value < word_modulus() {
        value
    } else {
        value % word_modulus()
    }
}

pub fn wrapping_sub(a: &Word, b: &Word) -> Word {
    if a >= b {
        a - b
    } else {
        word_modulus() - b + a
    }
}

pub fn from_bool(value: bool) -> Word {
    if value {
        BigUint::one()
    } else {
        BigUint::zero()
    }
}

/// Big-endian 32-byte encoding
pub fn to_bytes32(word: &Word) -> [u8; 32] {
    let bytes = word.to_bytes_be();
    let mut out = [0u8; 32];
    let n = bytes.len().min(32);
    out[32 - n..].copy_from_slice(&bytes[bytes.len() - n..]);
    out
}
