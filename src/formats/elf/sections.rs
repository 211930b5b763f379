//! Section header table walking.

use crate::error::{CovError, Result};
use crate::formats::elf::headers::FileHeader;
use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_addr, read_cstring, EndianRead};

/// One section header together with its resolved name and file bytes.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub name: &'a str,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    /// Bytes backing the section in the file image; empty for NOBITS or
    /// out-of-bounds sections.
    pub data: &'a [u8],
}

impl Section<'_> {
    /// Allocated and executable, the instrumentable kind.
    pub fn is_executable(&self) -> bool {
        self.sh_flags & (SHF_ALLOC | SHF_EXECINSTR) == (SHF_ALLOC | SHF_EXECINSTR)
    }
}

/// Walk the section header table once, yielding each section with its
/// name resolved through the section string table.
pub fn sections<'a>(data: &'a [u8], header: &FileHeader) -> Result<Vec<Section<'a>>> {
    let sh_offset = header.sh_offset as usize;
    let entsize = header.sh_entsize as usize;
    let num = header.sh_num as usize;

    if num == 0 || sh_offset == 0 {
        return Ok(Vec::new());
    }

    let expected_entsize = match header.class {
        ElfClass::Elf32 => 40,
        ElfClass::Elf64 => 64,
    };
    if entsize < expected_entsize {
        return Err(CovError::InvalidFormat(format!(
            "section header entry size {} too small",
            entsize
        )));
    }

    let table_size = num
        .checked_mul(entsize)
        .ok_or_else(|| CovError::InvalidFormat("section table overflow".to_string()))?;
    let table_end = sh_offset.checked_add(table_size).ok_or(CovError::Truncated {
        offset: sh_offset,
        needed: table_size,
    })?;
    if table_end > data.len() {
        return Err(CovError::Truncated {
            offset: sh_offset,
            needed: table_size,
        });
    }

    let mut raw = Vec::with_capacity(num);
    for i in 0..num {
        raw.push(parse_section_header(data, sh_offset + i * entsize, header)?);
    }

    // Section names live in the string table section
    let strtab: &[u8] = raw
        .get(header.sh_strndx as usize)
        .and_then(|sh| section_bytes(data, sh))
        .unwrap_or(&[]);

    let mut out = Vec::with_capacity(num);
    for sh in &raw {
        let name = read_cstring(strtab, sh.sh_name as usize).unwrap_or("");
        out.push(Section {
            name,
            sh_type: sh.sh_type,
            sh_flags: sh.sh_flags,
            sh_addr: sh.sh_addr,
            sh_offset: sh.sh_offset,
            sh_size: sh.sh_size,
            data: section_bytes(data, sh).unwrap_or(&[]),
        });
    }

    Ok(out)
}

#[derive(Debug, Clone, Copy)]
struct RawSectionHeader {
    sh_name: u32,
    sh_type: u32,
    sh_flags: u64,
    sh_addr: u64,
    sh_offset: u64,
    sh_size: u64,
}

/// SHT_NOBITS occupies no file bytes
const SHT_NOBITS: u32 = 8;

fn section_bytes<'a>(data: &'a [u8], sh: &RawSectionHeader) -> Option<&'a [u8]> {
    if sh.sh_type == SHT_NOBITS {
        return None;
    }
    let start = sh.sh_offset as usize;
    let end = start.checked_add(sh.sh_size as usize)?;
    data.get(start..end)
}

fn parse_section_header(
    data: &[u8],
    offset: usize,
    header: &FileHeader,
) -> Result<RawSectionHeader> {
    let endian = header.endian;
    match header.class {
        ElfClass::Elf32 => Ok(RawSectionHeader {
            sh_name: data.read_u32(offset, endian)?,
            sh_type: data.read_u32(offset + 4, endian)?,
            sh_flags: data.read_u32(offset + 8, endian)? as u64,
            sh_addr: data.read_u32(offset + 12, endian)? as u64,
            sh_offset: data.read_u32(offset + 16, endian)? as u64,
            sh_size: data.read_u32(offset + 20, endian)? as u64,
        }),
        ElfClass::Elf64 => Ok(RawSectionHeader {
            sh_name: data.read_u32(offset, endian)?,
            sh_type: data.read_u32(offset + 4, endian)?,
            sh_flags: data.read_u64(offset + 8, endian)?,
            sh_addr: read_addr(data, offset + 16, ElfClass::Elf64, endian)?,
            sh_offset: data.read_u64(offset + 24, endian)?,
            sh_size: data.read_u64(offset + 32, endian)?,
        }),
    }
}
