//! Note section parsing.

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{align_up, EndianRead};

/// Individual note entry
pub struct Note<'a> {
    pub n_type: u32,
    pub name: &'a str,
    pub desc: &'a [u8],
}

/// Note section containing build ID and other metadata
pub struct NoteSection<'a> {
    notes: Vec<Note<'a>>,
}

impl<'a> NoteSection<'a> {
    /// Parse a note section. The entry layout (three 32-bit words, name
    /// and descriptor padded to 4 bytes) is shared by both ELF classes.
    pub fn parse(data: &'a [u8], endian: ElfData) -> Self {
        let mut notes = Vec::new();
        let mut offset = 0;

        while offset + 12 <= data.len() {
            let n_namesz = match data.read_u32(offset, endian) {
                Ok(v) => v,
                Err(_) => break,
            };
            let n_descsz = match data.read_u32(offset + 4, endian) {
                Ok(v) => v,
                Err(_) => break,
            };
            let n_type = match data.read_u32(offset + 8, endian) {
                Ok(v) => v,
                Err(_) => break,
            };
            offset += 12;

            let name_end = offset + n_namesz as usize;
            if name_end > data.len() {
                break;
            }
            let name_bytes = &data[offset..name_end];
            let len = name_bytes
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(name_bytes.len());
            let name = std::str::from_utf8(&name_bytes[..len]).unwrap_or("");

            offset = align_up(name_end, 4);

            let desc_end = offset + n_descsz as usize;
            if desc_end > data.len() {
                break;
            }
            let desc = &data[offset..desc_end];
            offset = align_up(desc_end, 4);

            notes.push(Note { n_type, name, desc });
        }

        Self { notes }
    }

    /// The GNU build id descriptor, if present.
    pub fn build_id(&self) -> Option<&'a [u8]> {
        self.notes
            .iter()
            .find(|n| n.name == "GNU" && n.n_type == NT_GNU_BUILD_ID)
            .map(|n| n.desc)
    }
}
