//! Public parser surface and relocation state machine.
//!
//! An `ElfParser` is driven once per discovered file: `add_file`
//! registers the binary (the first call is the main binary and fixes
//! the address width for the whole run), `parse` runs the scan and line
//! resolution, and `set_main_file_relocation` supplies the runtime load
//! offset the tracer reports for position-independent executables.
//!
//! The two-phase protocol: a PIE main binary with dependent-library
//! tracking enabled defers its full parse until the relocation arrives;
//! `set_main_file_relocation` must be called after the initial `parse`
//! and before `add_file` is invoked for any dependent.

mod bridge;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::ChecksumReader;
use crate::dwarf;
use crate::error::{CovError, Result};
use crate::filter::SourcePathFilter;
use crate::formats::elf::types::EI_NIDENT;
use crate::formats::elf::{is_elf, parse_header, ElfClass};
use crate::gcov::CoverageRecordSource;
use crate::hashing::content_checksum;
use crate::listener::{FileFlags, FileListener, LineListener, SourceFile};
use crate::scan::{scan_object, DebugLink};
use crate::segment::Segment;
use crate::verify::AddressVerifier;

/// No confidence that this parser handles a file
pub const MATCH_NONE: u32 = 0;
/// The file is definitely this parser's format
pub const MATCH_PERFECT: u32 = 256;

/// Relocation protocol state for the main binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Unparsed,
    /// Main binary is position-independent and dependent tracking is on;
    /// the full parse waits for the tracer's relocation offset
    AwaitingRelocation,
    Parsed,
}

/// Address-resolution parser for ELF binaries.
pub struct ElfParser {
    config: Config,
    filter: Box<dyn SourcePathFilter>,
    verifier: Box<dyn AddressVerifier>,
    database: Box<dyn ChecksumReader>,
    coverage_source: Option<Box<dyn CoverageRecordSource>>,

    line_listeners: Vec<Box<dyn LineListener>>,
    file_listeners: Vec<Box<dyn FileListener>>,

    // Run-wide state
    class: Option<ElfClass>,
    checksum: u64,
    state: ParseState,
    is_main_file: bool,

    // Per-file state, reset by add_file
    filename: PathBuf,
    file_is_main: bool,
    is_shared: bool,
    current_checksum: u64,
    declared_segments: Vec<Segment>,
    exec_segments: Vec<Segment>,
    build_id: String,
    debug_link: Option<DebugLink>,
    side_notes_files: Vec<String>,
    relocation: u64,
    invalid_breakpoints: u32,
}

impl ElfParser {
    pub fn new(
        config: Config,
        filter: Box<dyn SourcePathFilter>,
        verifier: Box<dyn AddressVerifier>,
        database: Box<dyn ChecksumReader>,
    ) -> Self {
        Self {
            config,
            filter,
            verifier,
            database,
            coverage_source: None,
            line_listeners: Vec::new(),
            file_listeners: Vec::new(),
            class: None,
            checksum: 0,
            state: ParseState::Unparsed,
            is_main_file: true,
            filename: PathBuf::new(),
            file_is_main: false,
            is_shared: false,
            current_checksum: 0,
            declared_segments: Vec::new(),
            exec_segments: Vec::new(),
            build_id: String::new(),
            debug_link: None,
            side_notes_files: Vec::new(),
            relocation: 0,
            invalid_breakpoints: 0,
        }
    }

    /// Attach the legacy coverage side-file collaborator.
    pub fn with_coverage_source(mut self, source: Box<dyn CoverageRecordSource>) -> Self {
        self.coverage_source = Some(source);
        self
    }

    /// How well this parser fits a file, judged from its first bytes.
    pub fn match_parser(&self, _path: &Path, header_bytes: &[u8]) -> u32 {
        if is_elf(header_bytes) {
            MATCH_PERFECT
        } else {
            MATCH_NONE
        }
    }

    /// Register a listener for validated coverage points. Listeners are
    /// invoked in registration order.
    pub fn register_line_listener(&mut self, listener: Box<dyn LineListener>) {
        self.line_listeners.push(listener);
    }

    /// Register a listener for discovered files.
    pub fn register_file_listener(&mut self, listener: Box<dyn FileListener>) {
        self.file_listeners.push(listener);
    }

    /// Content checksum of the main binary. Sticky: the first computed
    /// value survives later rescans so the fallback-database key stays
    /// stable across the deferred-relocation flow.
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    /// Register a binary for parsing. The first call is the main binary;
    /// later calls add dependent shared libraries together with their
    /// actual load layout.
    pub fn add_file(&mut self, path: impl AsRef<Path>, declared: &[Segment]) -> Result<()> {
        let path = path.as_ref();

        self.filename = path.to_path_buf();
        self.file_is_main = self.is_main_file;
        self.build_id.clear();
        self.debug_link = None;
        self.side_notes_files.clear();
        self.exec_segments.clear();
        self.declared_segments = declared.to_vec();

        let data = fs::read(path).map_err(|e| {
            debug!(path = %path.display(), "cannot open");
            e
        })?;
        let header = parse_header(&data)?;

        if self.is_main_file {
            self.class = Some(header.class);
            self.is_shared = header.is_shared_object();
        } else if let Some(class) = self.class {
            if header.class != class {
                warn!(
                    path = %path.display(),
                    "dependent library width does not match the main binary"
                );
                return Err(CovError::WidthMismatch {
                    path: path.to_path_buf(),
                    expected: class.bits(),
                });
            }
        }

        self.current_checksum = content_checksum(&data)?;
        if self.checksum == 0 {
            self.checksum = self.current_checksum;
        }

        let flags = if self.is_main_file {
            FileFlags::None
        } else {
            FileFlags::SharedLibrary
        };
        self.notify_file(&SourceFile::new(path, self.current_checksum, flags));

        Ok(())
    }

    /// Parse the most recently added file.
    ///
    /// For a position-independent main binary with dependent tracking
    /// enabled this only arms the deferred parse; no line entries are
    /// emitted until `set_main_file_relocation` is called.
    pub fn parse(&mut self) -> Result<()> {
        let result = if self.is_main_file && self.is_shared && self.config.trace_dependents {
            self.state = ParseState::AwaitingRelocation;
            Ok(())
        } else {
            // Non-PIE, dependent library, or PIE without dependent
            // tracking: no better load information will arrive
            let r = self.do_parse(0);
            if self.is_main_file && r.is_ok() {
                self.state = ParseState::Parsed;
            }
            r
        };

        self.is_main_file = false;

        result
    }

    /// Supply the main binary's runtime relocation offset.
    ///
    /// Triggers the deferred parse when one is pending. A non-zero
    /// offset for a binary that turned out not to be position
    /// independent is a data inconsistency, logged and ignored.
    pub fn set_main_file_relocation(&mut self, relocation: u64) -> Result<()> {
        info!("main file relocation = {:#x}", relocation);

        if self.state == ParseState::AwaitingRelocation {
            self.do_parse(relocation)?;
            self.state = ParseState::Parsed;
        } else if relocation != 0 {
            warn!(
                "got a relocation of {:#x} for a static executable, \
                 the trace would probably not work",
                relocation
            );
        }

        Ok(())
    }

    fn do_parse(&mut self, relocation: u64) -> Result<()> {
        self.relocation = relocation;
        self.invalid_breakpoints = 0;

        let data = fs::read(&self.filename)?;
        let outcome = scan_object(&data, self.config.legacy_coverage)?;

        self.verifier.setup(&data, EI_NIDENT);
        self.exec_segments = outcome.segments;
        self.build_id = outcome.build_id;
        self.debug_link = outcome.debug_link;
        self.side_notes_files = outcome.side_notes_files;

        // Without a declared layout, the scanned ranges double as it
        // (identity translation)
        if self.declared_segments.is_empty() {
            self.declared_segments = self
                .exec_segments
                .iter()
                .map(|s| Segment::declared(s.base(), s.base(), s.size()))
                .collect();
        }

        for candidate in &outcome.side_candidates {
            let file = SourceFile::new(candidate, 0, FileFlags::CoverageSideData);
            for listener in &mut self.file_listeners {
                listener.on_file(&file);
            }
        }

        if self.config.legacy_coverage
            && !self.side_notes_files.is_empty()
            && self.coverage_source.is_some()
        {
            self.parse_side_files(relocation);
            return Ok(());
        }

        self.parse_line_info(&data)
    }

    fn parse_line_info(&mut self, data: &[u8]) -> Result<()> {
        let source = dwarf::resolve(
            &self.filename,
            data,
            &self.build_id,
            self.debug_link.as_ref(),
            &self.config,
        );

        let Some(source) = source else {
            // No debug info anywhere; fall back to previously recorded
            // addresses for this content checksum
            let addrs = self.database.get(self.current_checksum);
            debug!(path = %self.filename.display(), "no debug symbols");

            if addrs.is_empty() && self.file_is_main {
                return Err(CovError::NoDebugInfo {
                    path: self.filename.clone(),
                });
            }

            for addr in addrs {
                self.emit_line("", 1, addr);
            }
            return Ok(());
        };

        source.for_each_line(|file, line, addr| {
            self.emit_line(file, line, addr);
        })?;

        if self.invalid_breakpoints > 0 {
            info!(
                count = self.invalid_breakpoints,
                path = %self.filename.display(),
                "invalid breakpoints skipped"
            );
        }

        Ok(())
    }

    fn parse_side_files(&mut self, relocation: u64) {
        let Some(source) = self.coverage_source.as_ref() else {
            return;
        };

        let mut points = Vec::new();
        for notes_path in &self.side_notes_files {
            let data = match fs::read(notes_path) {
                Ok(d) => d,
                Err(_) => {
                    warn!(path = %notes_path, "cannot read coverage notes file");
                    continue;
                }
            };

            let records = match source.parse(&data) {
                Ok(r) => r,
                Err(err) => {
                    warn!(path = %notes_path, %err, "cannot parse coverage notes file");
                    continue;
                }
            };

            for rec in records {
                let addr = source.synthesize_address(
                    &rec.file,
                    rec.function,
                    rec.basic_block,
                    rec.index,
                );
                points.push((rec.file, rec.line, addr + relocation));
            }
        }

        // Synthetic addresses never lie inside real segments, so they
        // bypass the containment bridge
        for (file, line, addr) in points {
            for listener in &mut self.line_listeners {
                listener.on_line(&file, line, addr);
            }
        }
    }

    fn notify_file(&mut self, file: &SourceFile) {
        for listener in &mut self.file_listeners {
            listener.on_file(file);
        }
    }
}
