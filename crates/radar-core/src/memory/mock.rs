//! Sparse in-memory address space for tests.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// Padding written after strings so bounded reads of the default width succeed
const STRING_PADDING: usize = 64;

/// A read only succeeds when every requested byte has been written.
pub struct MockMemoryReader {
    bytes: BTreeMap<u64, u8>,
    base_address: u64,
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (0..size as u64)
            .map(|i| {
                let addr = address.wrapping_add(i);
                self.bytes.get(&addr).copied().ok_or_else(|| {
                    Error::read_failed(address, format!("unmapped byte at {:#x}", addr))
                })
            })
            .collect()
    }

    fn base_address(&self) -> u64 {
        self.base_address
    }
}

#[derive(Default)]
pub struct MockMemoryBuilder {
    bytes: BTreeMap<u64, u8>,
    base_address: u64,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_address(mut self, base: u64) -> Self {
        self.base_address = base;
        self
    }

    pub fn write_bytes(mut self, address: u64, data: &[u8]) -> Self {
        for (i, byte) in data.iter().enumerate() {
            self.bytes.insert(address + i as u64, *byte);
        }
        self
    }

    pub fn write_u64(self, address: u64, value: u64) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_f32(self, address: u64, value: f32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_i16(self, address: u64, value: i16) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Write a NUL-terminated string followed by zero padding.
    pub fn write_string(self, address: u64, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.resize(value.len() + STRING_PADDING, 0);
        self.write_bytes(address, &data)
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            bytes: self.bytes,
            base_address: self.base_address,
        }
    }
}
