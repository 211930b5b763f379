//! File header parsing.
//!
//! The identification bytes select the 32-bit or 64-bit layout exactly
//! once; everything downstream asks this header for class-appropriate
//! field offsets instead of re-branching per access site.

use crate::error::{CovError, Result};
use crate::formats::elf::types::*;
use crate::formats::elf::utils::{read_addr, EndianRead};

/// Parsed ELF file header, reduced to what the scanner needs.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub class: ElfClass,
    pub endian: ElfData,
    pub e_type: u16,
    pub e_machine: u16,
    pub sh_offset: u64,
    pub sh_entsize: u16,
    pub sh_num: u16,
    pub sh_strndx: u16,
}

impl FileHeader {
    /// True for ET_DYN: a shared object, or a position-independent
    /// executable when this is the main binary.
    pub fn is_shared_object(&self) -> bool {
        self.e_type == ET_DYN
    }
}

/// Quick magic check over the first few bytes of a file.
pub fn is_elf(data: &[u8]) -> bool {
    data.len() >= ELF_MAGIC.len() && &data[..ELF_MAGIC.len()] == ELF_MAGIC
}

/// Parse the file header; the class read from the identification bytes
/// drives which layout is used.
pub fn parse_header(data: &[u8]) -> Result<FileHeader> {
    if !is_elf(data) {
        return Err(CovError::InvalidFormat("bad ELF magic".to_string()));
    }
    if data.len() < EI_NIDENT {
        return Err(CovError::Truncated {
            offset: 0,
            needed: EI_NIDENT,
        });
    }

    let class = ElfClass::from_u8(data[4])?;
    let endian = ElfData::from_u8(data[5])?;

    let e_type = data.read_u16(16, endian)?;
    let e_machine = data.read_u16(18, endian)?;

    // Field offsets past e_version differ between the two layouts
    let (sh_offset_at, tail_at) = match class {
        ElfClass::Elf32 => (32usize, 46usize),
        ElfClass::Elf64 => (40usize, 58usize),
    };

    let sh_offset = read_addr(data, sh_offset_at, class, endian)?;
    let sh_entsize = data.read_u16(tail_at, endian)?;
    let sh_num = data.read_u16(tail_at + 2, endian)?;
    let sh_strndx = data.read_u16(tail_at + 4, endian)?;

    Ok(FileHeader {
        class,
        endian,
        e_type,
        e_machine,
        sh_offset,
        sh_entsize,
        sh_num,
        sh_strndx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_elf64() -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[0..4].copy_from_slice(b"\x7fELF");
        data[4] = 2; // 64-bit
        data[5] = 1; // little endian
        data[6] = 1; // version
        data[16] = 3; // e_type = ET_DYN
        data[18] = 62; // e_machine = EM_X86_64
        data[40] = 0x40; // e_shoff
        data[58] = 64; // e_shentsize
        data[60] = 3; // e_shnum
        data[62] = 2; // e_shstrndx
        data
    }

    #[test]
    fn test_parse_header_64() {
        let data = minimal_elf64();
        let hdr = parse_header(&data).unwrap();

        assert_eq!(hdr.class, ElfClass::Elf64);
        assert_eq!(hdr.endian, ElfData::Little);
        assert!(hdr.is_shared_object());
        assert_eq!(hdr.sh_offset, 0x40);
        assert_eq!(hdr.sh_entsize, 64);
        assert_eq!(hdr.sh_num, 3);
        assert_eq!(hdr.sh_strndx, 2);
    }

    #[test]
    fn test_parse_header_32() {
        let mut data = vec![0u8; 52];
        data[0..4].copy_from_slice(b"\x7fELF");
        data[4] = 1; // 32-bit
        data[5] = 1;
        data[16] = 2; // ET_EXEC
        data[32] = 0x34; // e_shoff
        data[46] = 40; // e_shentsize
        data[48] = 1; // e_shnum

        let hdr = parse_header(&data).unwrap();
        assert_eq!(hdr.class, ElfClass::Elf32);
        assert!(!hdr.is_shared_object());
        assert_eq!(hdr.sh_offset, 0x34);
        assert_eq!(hdr.sh_entsize, 40);
    }

    #[test]
    fn test_reject_bad_magic() {
        assert!(!is_elf(b"MZ\x90\x00"));
        assert!(parse_header(b"MZ\x90\x00rest-of-file").is_err());
        assert!(parse_header(b"\x7fEL").is_err());
    }
}
