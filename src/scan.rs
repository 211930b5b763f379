//! Single-pass object scanner.
//!
//! Walks a binary's section table once and extracts everything the
//! parser needs: executable byte ranges, the build id, the GNU debug
//! link reference and, in legacy coverage mode, embedded side-file names
//! found by a byte-pattern scan of the read-only data section.

use std::path::Path;

use memchr::{memmem, memrchr};
use tracing::debug;

use crate::error::Result;
use crate::formats::elf::types::SHT_NOTE;
use crate::formats::elf::utils::{align_up, EndianRead};
use crate::formats::elf::{parse_header, sections, FileHeader, NoteSection};
use crate::segment::Segment;

/// Marker terminating an embedded coverage data file name.
const SIDE_FILE_MARKER: &[u8] = b"gcda\0";

/// A GNU debug link reference: file name plus expected CRC32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLink {
    pub name: String,
    pub crc: u32,
}

/// Everything one section-table walk produces.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Executable+allocated sections, with byte copies
    pub segments: Vec<Segment>,
    /// Lowercase hex build id, empty when absent
    pub build_id: String,
    pub debug_link: Option<DebugLink>,
    /// Every data side-file name discovered in read-only data
    pub side_candidates: Vec<String>,
    /// Notes files whose data sibling was discovered and which exist on
    /// disk, ready for the coverage-data extractor
    pub side_notes_files: Vec<String>,
}

/// Scan a binary image. `legacy_coverage` enables the side-file name
/// scan of `.rodata`.
pub fn scan_object(data: &[u8], legacy_coverage: bool) -> Result<ScanOutcome> {
    let header = parse_header(data)?;
    let secs = sections(data, &header)?;

    let mut segments = Vec::new();
    let mut build_id = String::new();
    let mut debug_link = None;
    let mut side_candidates = Vec::new();

    for sec in &secs {
        if legacy_coverage && sec.name == ".rodata" {
            side_candidates.extend(scan_side_file_names(sec.data));
        }

        if sec.sh_type == SHT_NOTE {
            let notes = NoteSection::parse(sec.data, header.endian);
            if let Some(id) = notes.build_id() {
                build_id = hex::encode(id);
            }
        }

        if sec.name == ".gnu_debuglink" {
            debug_link = parse_debug_link(sec.data, &header);
        }

        if sec.is_executable() {
            segments.push(Segment::scanned(
                sec.sh_addr,
                sec.sh_addr,
                sec.sh_size,
                sec.data.to_vec(),
            ));
        }
    }

    // Pair each data file with its notes sibling; only existing pairs
    // are queued for extraction
    let mut side_notes_files = Vec::new();
    for candidate in &side_candidates {
        if let Some(notes) = notes_sibling(candidate) {
            if Path::new(&notes).exists() {
                side_notes_files.push(notes);
            } else {
                debug!(%candidate, %notes, "coverage notes sibling not found");
            }
        }
    }

    Ok(ScanOutcome {
        segments,
        build_id,
        debug_link,
        side_candidates,
        side_notes_files,
    })
}

/// Find every marker-terminated file name in a read-only data section.
///
/// For each marker match the enclosing null-terminated string is
/// recovered by walking backward to the previous NUL with bounds-checked
/// slice operations; a match with no preceding NUL is skipped.
pub fn scan_side_file_names(data: &[u8]) -> Vec<String> {
    let mut out = Vec::new();

    for pos in memmem::find_iter(data, SIDE_FILE_MARKER) {
        let Some(nul) = memrchr(0, &data[..pos]) else {
            // Runs into the start of the section; not a real name
            continue;
        };

        // Name spans from just past the previous NUL through the marker
        // (without its terminator)
        let name_bytes = &data[nul + 1..pos + SIDE_FILE_MARKER.len() - 1];
        match std::str::from_utf8(name_bytes) {
            Ok(name) if !name.is_empty() => out.push(name.to_string()),
            _ => debug!(offset = pos, "skipping non-UTF-8 side-file name"),
        }
    }

    out
}

/// Derive the notes file name from a data file name: the last two
/// characters designate the variant.
fn notes_sibling(data_name: &str) -> Option<String> {
    if data_name.len() < 2 || !data_name.ends_with("da") {
        return None;
    }
    let mut notes = data_name[..data_name.len() - 2].to_string();
    notes.push_str("no");
    Some(notes)
}

/// Extract the debug link: a null-terminated name, then the CRC32 at
/// the next 4-byte-aligned offset, in the file's endianness.
fn parse_debug_link(data: &[u8], header: &FileHeader) -> Option<DebugLink> {
    let name_len = data.iter().position(|&b| b == 0)?;
    let name = std::str::from_utf8(&data[..name_len]).ok()?;
    if name.is_empty() {
        return None;
    }

    let crc_offset = align_up(name_len + 1, 4);
    let crc = data.read_u32(crc_offset, header.endian).ok()?;

    Some(DebugLink {
        name: name.to_string(),
        crc,
    })
}
