//! BN254 scalar field arithmetic
//!
//! p = 0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001
//!
//! Properties:
//! - 254-bit prime, so every element fits one 32-byte machine word
//! - The generated contracts reduce with the native `ADDMOD`/`MULMOD` opcodes, which makes
//!   this the only arithmetic the code generator has to model on the host side
//! - Elements are stored in canonical form (0 <= value < p)

use crate::error::{Result, SpecError};
use num_bigint::BigUint;
use num_traits::{Num, One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;
use std::sync::OnceLock;

/// BN254 scalar field modulus (hex, no prefix)
pub const BN254_MODULUS_HEX: &str =
    "30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001";

/// Modulus as little-endian 32-bit digits
const MODULUS_DIGITS: [u32; 8] = [
    0xf000_0001,
    0x43e1_f593,
    0x79b9_7091,
    0x2833_e848,
    0x8181_585d,
    0xb850_45b6,
    0xe131_a029,
    0x3064_4e72,
];

/// BN254 scalar field element
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fr(BigUint);

impl Fr {
    /// The field modulus p
    pub fn modulus() -> &'static BigUint {
        static MODULUS: OnceLock<BigUint> = OnceLock::new();
        MODULUS.get_or_init(|| BigUint::from_slice(&MODULUS_DIGITS))
    }

    pub fn zero() -> Self {
        Fr(BigUint::zero())
    }

    pub fn one() -> Self {
        Fr(BigUint::one())
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_biguint(BigUint::from(value))
    }

    /// Create from any integer (reduces modulo p)
    pub fn from_biguint(value: BigUint) -> Self {
        if &value < Self::modulus() {
            Fr(value)
        } else {
            Fr(value % Self::modulus())
        }
    }

    /// Create from an integer that must already be canonical
    pub fn from_canonical(value: BigUint) -> Result<Self> {
        if &value < Self::modulus() {
            Ok(Fr(value))
        } else {
            Err(SpecError::NonCanonical(format!("0x{:x}", value)))
        }
    }

    /// Parse a hex string (optional `0x` prefix); values >= p are rejected
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(SpecError::InvalidFieldElement(s.to_string()));
        }
        let value = BigUint::from_str_radix(digits, 16)
            .map_err(|_| SpecError::InvalidFieldElement(s.to_string()))?;
        Self::from_canonical(value)
    }

    /// Interpret big-endian bytes (reduces modulo p)
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self::from_biguint(BigUint::from_bytes_be(bytes))
    }

    /// 32-byte big-endian encoding, the on-wire form of a calldata/return word
    pub fn to_bytes_be(&self) -> [u8; 32] {
        let bytes = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Exponentiation by a small exponent
    pub fn pow(&self, exp: u64) -> Self {
        Fr(self.0.modpow(&BigUint::from(exp), Self::modulus()))
    }

    /// Multiplicative inverse (Fermat), `None` for zero
    pub fn inverse(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let exp = Self::modulus() - BigUint::from(2u32);
        Some(Fr(self.0.modpow(&exp, Self::modulus())))
    }

    /// `0x`-prefixed, zero-padded to 64 hex digits
    pub fn to_hex(&self) -> String {
        format!("0x{:064x}", self.0)
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fr({})", self.to_hex())
    }
}

impl FromStr for Fr {
    type Err = SpecError;

    /// Hex with `0x` prefix, decimal otherwise
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("0x") || s.starts_with("0X") {
            return Self::from_hex(s);
        }
        let value = BigUint::from_str_radix(s, 10)
            .map_err(|_| SpecError::InvalidFieldElement(s.to_string()))?;
        Self::from_canonical(value)
    }
}

impl From<u64> for Fr {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<Fr> for String {
    fn from(value: Fr) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for Fr {
    type Error = SpecError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

fn add_mod(a: &BigUint, b: &BigUint) -> Fr {
    let sum = a + b;
    if &sum >= Fr::modulus() {
        Fr(sum - Fr::modulus())
    } else {
        Fr(sum)
    }
}

fn sub_mod(a: &BigUint, b: &BigUint) -> Fr {
    if a >= b {
        Fr(a - b)
    } else {
        Fr(Fr::modulus() - b + a)
    }
}

fn mul_mod(a: &BigUint, b: &BigUint) -> Fr {
    Fr((a * b) % Fr::modulus())
}

macro_rules! impl_binop {
    ($trait:ident, $method:ident, $f:ident) => {
        impl $trait for Fr {
            type Output = Fr;

            #[inline]
            fn $method(self, rhs: Fr) -> Fr {
                $f(&self.0, &rhs.0)
            }
        }

        impl<'a> $trait<&'a Fr> for Fr {
            type Output = Fr;

            #[inline]
            fn $method(self, rhs: &'a Fr) -> Fr {
                $f(&self.0, &rhs.0)
            }
        }

        impl<'a, 'b> $trait<&'b Fr> for &'a Fr {
            type Output = Fr;

            #[inline]
            fn $method(self, rhs: &'b Fr) -> Fr {
                $f(&self.0, &rhs.0)
            }
        }
    };
}

impl_binop!(Add, add, add_mod);
impl_binop!(Sub, sub, sub_mod);
impl_binop!(Mul, mul, mul_mod);

impl Neg for Fr {
    type Output = Fr;

    fn neg(self) -> Fr {
        sub_mod(&BigUint::zero(), &self.0)
    }
}

impl<'a> Neg for &'a Fr {
    type Output = Fr;

    fn neg(self) -> Fr {
        sub_mod(&BigUint::zero(), &self.0)
    }
}
