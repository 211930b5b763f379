//! Debug-info discovery and line walking.
//!
//! Locates one usable line-number source for a binary, trying embedded
//! debug info first, then the build-id path convention, then GNU debug
//! link candidates validated by CRC32. The chosen source is walked once
//! and every line-table row is handed to the caller.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use object::{Object, ObjectSection};
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::hashing::debug_link_crc32;
use crate::scan::DebugLink;

/// An opened line-number source, holding the raw debug file image.
pub struct DebugSource {
    bytes: Vec<u8>,
}

impl DebugSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Whether the image carries a non-empty line table.
    pub fn has_line_info(&self) -> bool {
        image_has_line_info(&self.bytes)
    }

    /// Walk every compilation unit's line program, yielding
    /// (path, line, address) per row. End-of-sequence rows are skipped.
    pub fn for_each_line<F>(&self, mut emit: F) -> Result<()>
    where
        F: FnMut(&str, u32, u64),
    {
        let file = object::File::parse(&*self.bytes)?;
        let endian = if file.is_little_endian() {
            gimli::RunTimeEndian::Little
        } else {
            gimli::RunTimeEndian::Big
        };

        let load_section = |id: gimli::SectionId| -> std::result::Result<
            Cow<'_, [u8]>,
            gimli::Error,
        > {
            Ok(file
                .section_by_name(id.name())
                .and_then(|section| section.uncompressed_data().ok())
                .unwrap_or(Cow::Borrowed(&[][..])))
        };

        let borrow_section: &dyn for<'b> Fn(
            &'b Cow<'_, [u8]>,
        ) -> gimli::EndianSlice<'b, gimli::RunTimeEndian> =
            &|section| gimli::EndianSlice::new(Cow::as_ref(section), endian);

        let dwarf_sections = gimli::DwarfSections::load(&load_section)?;
        let dwarf = dwarf_sections.borrow(borrow_section);

        let mut units = dwarf.units();
        while let Some(unit_header) = units.next()? {
            let unit = dwarf.unit(unit_header)?;
            let Some(program) = unit.line_program.clone() else {
                continue;
            };

            let comp_dir = match unit.comp_dir {
                Some(dir) => dir.to_string_lossy().into_owned(),
                None => String::new(),
            };

            let mut rows = program.rows();
            while let Some((header, row)) = rows.next_row()? {
                if row.end_sequence() {
                    continue;
                }
                let Some(line) = row.line() else {
                    continue;
                };
                let Some(file_entry) = row.file(header) else {
                    continue;
                };

                let name = dwarf
                    .attr_string(&unit, file_entry.path_name())?
                    .to_string_lossy()
                    .into_owned();

                let path = if name.starts_with('/') {
                    name
                } else {
                    let dir = match file_entry.directory(header) {
                        Some(attr) => {
                            dwarf.attr_string(&unit, attr)?.to_string_lossy().into_owned()
                        }
                        None => String::new(),
                    };
                    let base = if dir.starts_with('/') {
                        dir
                    } else {
                        join_path(&comp_dir, &dir)
                    };
                    join_path(&base, &name)
                };

                emit(&path, line.get() as u32, row.address());
            }
        }

        Ok(())
    }
}

fn join_path(base: &str, rest: &str) -> String {
    if base.is_empty() {
        return rest.to_string();
    }
    if rest.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), rest)
}

/// Locate one usable line-info source for a binary.
///
/// `binary_data` is the already-read image of the binary itself; the
/// returned source may be that image (embedded debug info) or an
/// external debug file found via the build id or debug link.
pub fn resolve(
    binary_path: &Path,
    binary_data: &[u8],
    build_id: &str,
    debug_link: Option<&DebugLink>,
    config: &Config,
) -> Option<DebugSource> {
    if image_has_line_info(binary_data) {
        return Some(DebugSource::new(binary_data.to_vec()));
    }

    if !build_id.is_empty() {
        let candidate = build_id_path(&config.build_id_root, build_id);
        match fs::read(&candidate) {
            Ok(bytes) if image_has_line_info(&bytes) => {
                return Some(DebugSource::new(bytes));
            }
            Ok(_) => debug!(path = %candidate.display(), "build-id file has no line info"),
            Err(_) => debug!(path = %candidate.display(), "cannot open build-id file"),
        }
    }

    if let Some(link) = debug_link {
        if let Some(bytes) = lookup_debug_link(binary_path, link, config) {
            if image_has_line_info(&bytes) {
                return Some(DebugSource::new(bytes));
            }
            debug!(name = %link.name, "debug-link file has no line info");
        }
    }

    None
}

/// Canonical build-id search path: the first two hex characters form a
/// subdirectory, the rest plus a fixed suffix the file name.
pub fn build_id_path(root: &Path, build_id: &str) -> PathBuf {
    root.join(&build_id[..2.min(build_id.len())])
        .join(format!("{}.debug", &build_id[2.min(build_id.len())..]))
}

/// Try the three standard debug-link locations in order, accepting a
/// candidate only when its CRC32 matches the expected value.
fn lookup_debug_link(binary_path: &Path, link: &DebugLink, config: &Config) -> Option<Vec<u8>> {
    let dir = binary_path.parent().unwrap_or(Path::new("."));

    // Same directory as the binary
    if let Some(bytes) = try_debug_link(&dir.join(&link.name), link.crc) {
        return Some(bytes);
    }

    // .debug subdirectory
    if let Some(bytes) = try_debug_link(&dir.join(".debug").join(&link.name), link.crc) {
        return Some(bytes);
    }

    // Fixed system root mirrored under the real directory path
    let real_dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let mirrored = config
        .debug_root
        .join(real_dir.strip_prefix("/").unwrap_or(&real_dir))
        .join(&link.name);
    try_debug_link(&mirrored, link.crc)
}

fn try_debug_link(path: &Path, expected_crc: u32) -> Option<Vec<u8>> {
    let bytes = fs::read(path).ok()?;
    let crc = debug_link_crc32(&bytes);

    if crc != expected_crc {
        debug!(
            "CRC mismatch for debug link {}: should be {:#010x}, is {:#010x}",
            path.display(),
            expected_crc,
            crc
        );
        return None;
    }

    Some(bytes)
}

fn image_has_line_info(data: &[u8]) -> bool {
    object::File::parse(data)
        .ok()
        .and_then(|file| {
            file.section_by_name(".debug_line")
                .map(|s| s.size() > 0)
        })
        .unwrap_or(false)
}
