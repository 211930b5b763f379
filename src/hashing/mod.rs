//! Checksum engine: content identity and debug-link CRC32.

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::formats::elf::types::{SHF_ALLOC, EI_NIDENT};
use crate::formats::elf::{parse_header, sections};

/// Reflected IEEE 802.3 polynomial
const CRC32_POLY: u32 = 0xedb88320;

static CRC32_TABLE: Lazy<[u32; 256]> = Lazy::new(|| {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC32_POLY
            } else {
                crc >> 1
            };
        }
        *entry = crc;
    }
    table
});

/// CRC32 as specified for GNU debug links: table-driven, seeded with
/// all-ones, complemented at the end.
pub fn debug_link_crc32(buf: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &b in buf {
        crc = CRC32_TABLE[((crc ^ b as u32) & 0xff) as usize] ^ (crc >> 8);
    }
    !crc
}

/// Content-derived identity for a binary.
///
/// Hashes the identification bytes, the file type/machine and every
/// section header's shape plus allocated section contents, so the value
/// is stable for byte-identical content regardless of path and
/// distinguishes the 32- and 64-bit layouts. Used as the join key for
/// the checksum database.
pub fn content_checksum(data: &[u8]) -> Result<u64> {
    let header = parse_header(data)?;
    let secs = sections(data, &header)?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(&data[..EI_NIDENT]);
    hasher.update(&header.e_type.to_le_bytes());
    hasher.update(&header.e_machine.to_le_bytes());

    for sec in &secs {
        hasher.update(&sec.sh_type.to_le_bytes());
        hasher.update(&sec.sh_flags.to_le_bytes());
        hasher.update(&sec.sh_addr.to_le_bytes());
        hasher.update(&sec.sh_size.to_le_bytes());
        if sec.sh_flags & SHF_ALLOC != 0 {
            hasher.update(sec.data);
        }
    }

    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest.as_bytes()[..8].try_into().unwrap();
    Ok(u64::from_le_bytes(bytes))
}
