//! Utility functions for ELF parsing.

use crate::error::{CovError, Result};
use crate::formats::elf::types::{ElfClass, ElfData};

/// Trait for reading values with endianness support
pub trait EndianRead {
    fn read_u16(&self, offset: usize, data: ElfData) -> Result<u16>;
    fn read_u32(&self, offset: usize, data: ElfData) -> Result<u32>;
    fn read_u64(&self, offset: usize, data: ElfData) -> Result<u64>;
}

impl EndianRead for [u8] {
    fn read_u16(&self, offset: usize, data: ElfData) -> Result<u16> {
        if offset + 2 > self.len() {
            return Err(CovError::Truncated { offset, needed: 2 });
        }
        let bytes: [u8; 2] = self[offset..offset + 2].try_into().unwrap();
        Ok(match data {
            ElfData::Little => u16::from_le_bytes(bytes),
            ElfData::Big => u16::from_be_bytes(bytes),
        })
    }

    fn read_u32(&self, offset: usize, data: ElfData) -> Result<u32> {
        if offset + 4 > self.len() {
            return Err(CovError::Truncated { offset, needed: 4 });
        }
        let bytes: [u8; 4] = self[offset..offset + 4].try_into().unwrap();
        Ok(match data {
            ElfData::Little => u32::from_le_bytes(bytes),
            ElfData::Big => u32::from_be_bytes(bytes),
        })
    }

    fn read_u64(&self, offset: usize, data: ElfData) -> Result<u64> {
        if offset + 8 > self.len() {
            return Err(CovError::Truncated { offset, needed: 8 });
        }
        let bytes: [u8; 8] = self[offset..offset + 8].try_into().unwrap();
        Ok(match data {
            ElfData::Little => u64::from_le_bytes(bytes),
            ElfData::Big => u64::from_be_bytes(bytes),
        })
    }
}

/// Read an address-sized value based on ELF class
pub fn read_addr(data: &[u8], offset: usize, class: ElfClass, endian: ElfData) -> Result<u64> {
    match class {
        ElfClass::Elf32 => data.read_u32(offset, endian).map(|v| v as u64),
        ElfClass::Elf64 => data.read_u64(offset, endian),
    }
}

/// Read a null-terminated string from data
pub fn read_cstring(data: &[u8], offset: usize) -> Result<&str> {
    if offset >= data.len() {
        return Err(CovError::Truncated { offset, needed: 1 });
    }

    let slice = &data[offset..];
    let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());

    std::str::from_utf8(&slice[..end])
        .map_err(|_| CovError::InvalidFormat("string not UTF-8".to_string()))
}

/// Align a value up to the specified alignment
pub fn align_up(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        value
    } else {
        (value + alignment - 1) & !(alignment - 1)
    }
}
