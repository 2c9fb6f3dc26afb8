//! Interface descriptor and function selectors
//!
//! The generated program accepts one fixed-length array argument in either of
//! two element encodings that are identical on the wire. The descriptor uses the
//! JSON ABI shape understood by contract tooling.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Element encoding of the array argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgEncoding {
    Bytes32,
    Uint256,
}

impl ArgEncoding {
    /// Both encodings, in descriptor order
    pub const ALL: [ArgEncoding; 2] = [ArgEncoding::Bytes32, ArgEncoding::Uint256];

    pub fn element_type(self) -> &'static str {
        match self {
            ArgEncoding::Bytes32 => "bytes32",
            ArgEncoding::Uint256 => "uint256",
        }
    }

    /// `uint256[n]` / `bytes32[n]`
    pub fn array_type(self, n_inputs: usize) -> String {
        format!("{}[{}]", self.element_type(), n_inputs)
    }
}

impl fmt::Display for ArgEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_type())
    }
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// First four bytes of the Keccak-256 of a canonical signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `name(type)` for a single-argument function
pub fn signature(name: &str, encoding: ArgEncoding, n_inputs: usize) -> String {
    format!("{}({})", name, encoding.array_type(n_inputs))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(rename = "internalType")]
    pub internal_type: String,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl AbiParam {
    fn new(name: &str, ty: String) -> Self {
        Self {
            internal_type: ty.clone(),
            name: name.to_string(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiFunction {
    pub constant: bool,
    pub inputs: Vec<AbiParam>,
    pub name: String,
    pub outputs: Vec<AbiParam>,
    pub payable: bool,
    pub state_mutability: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl AbiFunction {
    /// Pure function taking `encoding[n_inputs]` and returning one word of the same encoding
    pub fn new(name: &str, encoding: ArgEncoding, n_inputs: usize) -> Self {
        Self {
            constant: true,
            inputs: vec![AbiParam::new("input", encoding.array_type(n_inputs))],
            name: name.to_string(),
            outputs: vec![AbiParam::new("", encoding.element_type().to_string())],
            payable: false,
            state_mutability: "pure".to_string(),
            kind: "function".to_string(),
        }
    }

    /// Canonical signature, e.g. `poseidon(uint256[2])`
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.inputs.iter().map(|p| p.ty.as_str()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }
}

/// Overloaded entry point, one [`AbiFunction`] per encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceDescriptor {
    pub functions: Vec<AbiFunction>,
}

impl InterfaceDescriptor {
    pub fn poseidon(name: &str, n_inputs: usize) -> Self {
        let functions = ArgEncoding::ALL
            .iter()
            .map(|&encoding| AbiFunction::new(name, encoding, n_inputs))
            .collect();
        Self { functions }
    }

    pub fn signatures(&self) -> Vec<String> {
        self.functions.iter().map(AbiFunction::signature).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
