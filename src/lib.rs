//! covpoint resolves machine instruction addresses inside compiled ELF
//! binaries to source file/line pairs, and determines which addresses are
//! legitimate instrumentable instruction boundaries.
//!
//! It is the address-resolution foundation of a binary-level coverage tool:
//! the [`parser::ElfParser`] scans a binary's section table, locates debug
//! information (embedded, build-id convention or GNU debug link), validates
//! every candidate address against the executable segments, translates it
//! through the runtime load layout and forwards the final (file, line,
//! address) triples to registered listeners.

/// Crate-wide error types
pub mod error;

/// Tracing/logging setup
pub mod logging;

/// Explicit run configuration (no global state)
pub mod config;

/// Addressable byte ranges with containment and translation
pub mod segment;

/// Line/file listener traits and file discovery types
pub mod listener;

/// Source path mangling boundary
pub mod filter;

/// Instruction-boundary verification boundary
pub mod verify;

/// Checksum database fallback reader
pub mod db;

/// Content checksum and debug-link CRC32
pub mod hashing;

/// Low-level container format access
pub mod formats;

/// Single-pass object scanner
pub mod scan;

/// Debug-info discovery and DWARF line walking
pub mod dwarf;

/// Legacy coverage side-file glue
pub mod gcov;

/// Public parser surface and relocation state machine
pub mod parser;

pub use error::{CovError, Result};
pub use parser::ElfParser;
pub use segment::Segment;
