//! Core ELF types and constants.

use crate::error::{CovError, Result};

/// ELF magic number
pub const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Size of the identification bytes
pub const EI_NIDENT: usize = 16;

/// Note type for the GNU build id
pub const NT_GNU_BUILD_ID: u32 = 3;

/// Section holds a note table
pub const SHT_NOTE: u32 = 7;

/// Section occupies memory during execution
pub const SHF_ALLOC: u64 = 0x2;

/// Section contains executable instructions
pub const SHF_EXECINSTR: u64 = 0x4;

/// Executable file type
pub const ET_EXEC: u16 = 2;

/// Shared object (or position-independent executable) file type
pub const ET_DYN: u16 = 3;

/// ELF class (32-bit or 64-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfClass {
    Elf32 = 1,
    Elf64 = 2,
}

impl ElfClass {
    pub fn from_u8(val: u8) -> Result<Self> {
        match val {
            1 => Ok(ElfClass::Elf32),
            2 => Ok(ElfClass::Elf64),
            _ => Err(CovError::InvalidFormat(format!(
                "unsupported ELF class: {}",
                val
            ))),
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            ElfClass::Elf32 => 32,
            ElfClass::Elf64 => 64,
        }
    }
}

/// ELF data encoding (endianness)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfData {
    Little = 1,
    Big = 2,
}

impl ElfData {
    pub fn from_u8(val: u8) -> Result<Self> {
        match val {
            1 => Ok(ElfData::Little),
            2 => Ok(ElfData::Big),
            _ => Err(CovError::InvalidFormat(format!(
                "unsupported ELF data encoding: {}",
                val
            ))),
        }
    }
}
