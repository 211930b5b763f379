//! Shared fixtures: a minimal ELF64 image builder and DWARF line-table
//! synthesis for end-to-end parser tests.

use gimli::write::{Address, AttributeValue, DwarfUnit, EndianVec, LineProgram, LineString,
    Sections};

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOTE: u32 = 7;

pub const SHF_ALLOC: u64 = 0x2;
pub const SHF_EXECINSTR: u64 = 0x4;

pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;

struct SectionSpec {
    name: String,
    sh_type: u32,
    sh_flags: u64,
    sh_addr: u64,
    data: Vec<u8>,
}

/// Builds little-endian ELF64 images with an arbitrary section set.
pub struct ElfBuilder {
    e_type: u16,
    sections: Vec<SectionSpec>,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self {
            e_type: ET_EXEC,
            sections: Vec::new(),
        }
    }

    /// Mark the image ET_DYN (shared object / PIE).
    pub fn shared(mut self) -> Self {
        self.e_type = ET_DYN;
        self
    }

    pub fn section(
        mut self,
        name: &str,
        sh_type: u32,
        sh_flags: u64,
        sh_addr: u64,
        data: Vec<u8>,
    ) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            sh_type,
            sh_flags,
            sh_addr,
            data,
        });
        self
    }

    /// Executable .text at the given address.
    pub fn text(self, addr: u64, data: Vec<u8>) -> Self {
        self.section(
            ".text",
            SHT_PROGBITS,
            SHF_ALLOC | SHF_EXECINSTR,
            addr,
            data,
        )
    }

    pub fn rodata(self, data: Vec<u8>) -> Self {
        self.section(".rodata", SHT_PROGBITS, SHF_ALLOC, 0x2000, data)
    }

    /// GNU build-id note with the given raw descriptor bytes.
    pub fn build_id(self, id: &[u8]) -> Self {
        let mut note = Vec::new();
        note.extend_from_slice(&4u32.to_le_bytes()); // n_namesz
        note.extend_from_slice(&(id.len() as u32).to_le_bytes()); // n_descsz
        note.extend_from_slice(&3u32.to_le_bytes()); // NT_GNU_BUILD_ID
        note.extend_from_slice(b"GNU\0");
        note.extend_from_slice(id);
        while note.len() % 4 != 0 {
            note.push(0);
        }
        self.section(".note.gnu.build-id", SHT_NOTE, SHF_ALLOC, 0x200, note)
    }

    /// .gnu_debuglink with the referenced name and expected CRC32.
    pub fn debug_link(self, name: &str, crc: u32) -> Self {
        let mut data = name.as_bytes().to_vec();
        data.push(0);
        while data.len() % 4 != 0 {
            data.push(0);
        }
        data.extend_from_slice(&crc.to_le_bytes());
        self.section(".gnu_debuglink", SHT_PROGBITS, 0, 0, data)
    }

    pub fn build(self) -> Vec<u8> {
        const EHDR_SIZE: usize = 64;
        const SHDR_SIZE: usize = 64;

        // Section name string table, with a leading NUL
        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for sec in &self.sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(sec.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name_offset = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");

        // Lay out section contents after the header
        let mut image = vec![0u8; EHDR_SIZE];
        let mut offsets = Vec::new();
        for sec in &self.sections {
            while image.len() % 8 != 0 {
                image.push(0);
            }
            offsets.push(image.len() as u64);
            image.extend_from_slice(&sec.data);
        }
        while image.len() % 8 != 0 {
            image.push(0);
        }
        let shstrtab_offset = image.len() as u64;
        image.extend_from_slice(&shstrtab);
        while image.len() % 8 != 0 {
            image.push(0);
        }

        let sh_offset = image.len() as u64;
        let sh_num = (self.sections.len() + 2) as u16; // null + sections + shstrtab
        let shstrndx = sh_num - 1;

        // Null section header
        image.extend_from_slice(&[0u8; SHDR_SIZE]);

        for (i, sec) in self.sections.iter().enumerate() {
            image.extend_from_slice(&section_header(
                name_offsets[i],
                sec.sh_type,
                sec.sh_flags,
                sec.sh_addr,
                offsets[i],
                sec.data.len() as u64,
            ));
        }

        image.extend_from_slice(&section_header(
            shstrtab_name_offset,
            SHT_STRTAB,
            0,
            0,
            shstrtab_offset,
            shstrtab.len() as u64,
        ));

        // Fill in the file header
        image[0..4].copy_from_slice(b"\x7fELF");
        image[4] = 2; // ELFCLASS64
        image[5] = 1; // little endian
        image[6] = 1; // EV_CURRENT
        image[16..18].copy_from_slice(&self.e_type.to_le_bytes());
        image[18..20].copy_from_slice(&62u16.to_le_bytes()); // EM_X86_64
        image[20..24].copy_from_slice(&1u32.to_le_bytes()); // e_version
        image[40..48].copy_from_slice(&sh_offset.to_le_bytes()); // e_shoff
        image[52..54].copy_from_slice(&(EHDR_SIZE as u16).to_le_bytes()); // e_ehsize
        image[58..60].copy_from_slice(&(SHDR_SIZE as u16).to_le_bytes()); // e_shentsize
        image[60..62].copy_from_slice(&sh_num.to_le_bytes()); // e_shnum
        image[62..64].copy_from_slice(&shstrndx.to_le_bytes()); // e_shstrndx

        image
    }
}

fn section_header(
    sh_name: u32,
    sh_type: u32,
    sh_flags: u64,
    sh_addr: u64,
    sh_offset: u64,
    sh_size: u64,
) -> [u8; 64] {
    let mut hdr = [0u8; 64];
    hdr[0..4].copy_from_slice(&sh_name.to_le_bytes());
    hdr[4..8].copy_from_slice(&sh_type.to_le_bytes());
    hdr[8..16].copy_from_slice(&sh_flags.to_le_bytes());
    hdr[16..24].copy_from_slice(&sh_addr.to_le_bytes());
    hdr[24..32].copy_from_slice(&sh_offset.to_le_bytes());
    hdr[32..40].copy_from_slice(&sh_size.to_le_bytes());
    // sh_link/sh_info zero, sh_addralign 1
    hdr[48..56].copy_from_slice(&1u64.to_le_bytes());
    hdr
}

/// Synthesize DWARF sections describing one sequence of line rows for a
/// single source file, and return them as (section name, bytes) pairs
/// ready to append to an `ElfBuilder`.
pub fn synthesize_line_table(
    comp_dir: &str,
    file_name: &str,
    base_addr: u64,
    sequence_len: u64,
    rows: &[(u64, u64)], // (address, line)
) -> Vec<(String, Vec<u8>)> {
    let encoding = gimli::Encoding {
        format: gimli::Format::Dwarf32,
        version: 4,
        address_size: 8,
    };

    let mut dwarf = DwarfUnit::new(encoding);

    let mut program = LineProgram::new(
        encoding,
        gimli::LineEncoding::default(),
        LineString::String(comp_dir.as_bytes().to_vec()),
        None,
        LineString::String(file_name.as_bytes().to_vec()),
        None,
    );
    let dir_id = program.default_directory();
    let file_id = program.add_file(
        LineString::String(file_name.as_bytes().to_vec()),
        dir_id,
        None,
    );

    program.begin_sequence(Some(Address::Constant(base_addr)));
    for &(addr, line) in rows {
        let row = program.row();
        row.address_offset = addr - base_addr;
        row.file = file_id;
        row.line = line;
        program.generate_row();
    }
    program.end_sequence(sequence_len);

    dwarf.unit.line_program = program;

    let root = dwarf.unit.root();
    dwarf.unit.get_mut(root).set(
        gimli::DW_AT_comp_dir,
        AttributeValue::String(comp_dir.as_bytes().to_vec()),
    );
    dwarf.unit.get_mut(root).set(
        gimli::DW_AT_name,
        AttributeValue::String(file_name.as_bytes().to_vec()),
    );

    let mut sections = Sections::new(EndianVec::new(gimli::LittleEndian));
    dwarf.write(&mut sections).expect("dwarf write");

    let mut out = Vec::new();
    sections
        .for_each(|id, data| -> Result<(), gimli::Error> {
            if !data.slice().is_empty() {
                out.push((id.name().to_string(), data.slice().to_vec()));
            }
            Ok(())
        })
        .unwrap();
    out
}

/// A debug-info file: the DWARF sections wrapped in a bare ELF container.
pub fn debug_file(
    comp_dir: &str,
    file_name: &str,
    base_addr: u64,
    sequence_len: u64,
    rows: &[(u64, u64)],
) -> Vec<u8> {
    let mut builder = ElfBuilder::new();
    for (name, data) in synthesize_line_table(comp_dir, file_name, base_addr, sequence_len, rows)
    {
        builder = builder.section(&name, SHT_PROGBITS, 0, 0, data);
    }
    builder.build()
}
