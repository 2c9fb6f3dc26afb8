//! Byte-addressed scratch memory
//!
//! Memory grows in 32-byte words on first touch. Growth is charged with the usual
//! `3 * words + words^2 / 512` cost.

use crate::error::{Result, RuntimeError};
use crate::word::{to_bytes32, Word};
use num_bigint::BigUint;
use poseidon_evm_spec::WORD_SIZE;

#[derive(Debug, Clone)]
pub struct Memory {
    data: Vec<u8>,
    limit: usize,
}

impl Memory {
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
        }
    }

    /// Current size in bytes (always a multiple of 32)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn cost(words: u64) -> u64 {
        3 * words + words * words / 512
    }

    /// Make `[offset, offset + len)` addressable and return the gas for the growth
    pub fn expand(&mut self, offset: usize, len: usize) -> Result<u64> {
        if len == 0 {
            return Ok(0);
        }
        let end = offset
            .checked_add(len)
            .ok_or(RuntimeError::MemoryLimitExceeded {
                requested: usize::MAX,
                limit: self.limit,
            })?;
        if end <= self.data.len() {
            return Ok(0);
        }
        let new_size = end.div_ceil(WORD_SIZE) * WORD_SIZE;
        if new_size > self.limit {
            return Err(RuntimeError::MemoryLimitExceeded {
                requested: new_size,
                limit: self.limit,
            });
        }
        let old_words = (self.data.len() / WORD_SIZE) as u64;
        let new_words = (new_size / WORD_SIZE) as u64;
        self.data.resize(new_size, 0);
        Ok(Self::cost(new_words) - Self::cost(old_words))
    }

    /// Read one word; the range must have been expanded
    pub fn load_word(&self, offset: usize) -> Word {
        BigUint::from_bytes_be(&self.data[offset..offset + WORD_SIZE])
    }

    /// Write one word; the range must have been expanded
    pub fn store_word(&mut self, offset: usize, value: &Word) {
        self.data[offset..offset + WORD_SIZE].copy_from_slice(&to_bytes32(value));
    }

    /// Copy bytes in; the range must have been expanded
    pub fn store_bytes(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Copy bytes out; the range must have been expanded
    pub fn read(&self, offset: usize, len: usize) -> Vec<u8> {
        if len == 0 {
            return Vec::new();
        }
        self.data[offset..offset + len].to_vec()
    }
}
