//! Bounds-checked ELF container access.
//!
//! Only what the object scanner needs: the file header, the section
//! header table and note sections. Heavier lifting (DWARF loading) goes
//! through the object/gimli crates in the dwarf module.

pub mod headers;
pub mod notes;
pub mod sections;
pub mod types;
pub mod utils;

pub use headers::{is_elf, parse_header, FileHeader};
pub use notes::NoteSection;
pub use sections::{sections, Section};
pub use types::{ElfClass, ElfData};
