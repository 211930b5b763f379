//! Error types for the covpoint address-resolution engine.
//!
//! Callers treat an `Err` from `add_file`/`parse` as the only hard-stop
//! signal; everything recoverable is logged and swallowed at the site
//! where it occurs.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for covpoint operations.
#[derive(Debug, Error)]
pub enum CovError {
    /// Binary container format errors
    #[error("Invalid binary format: {0}")]
    InvalidFormat(String),

    /// A read past the end of the file image
    #[error("Truncated data at offset {offset:#x}, needed {needed} bytes")]
    Truncated { offset: usize, needed: usize },

    /// The run is locked to one address width; a dependent mismatched it
    #[error("Address width mismatch for {path}: run is {expected}-bit")]
    WidthMismatch { path: PathBuf, expected: u8 },

    /// No line information and no fallback entry for the main binary
    #[error(
        "No usable debug information in {path}: rebuild with -g/-ggdb, \
         a build-id or GNU debug link information"
    )]
    NoDebugInfo { path: PathBuf },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// DWARF reading errors
    #[error("DWARF error: {0}")]
    Dwarf(#[from] gimli::Error),

    /// Object file reading errors
    #[error("Object error: {0}")]
    Object(#[from] object::Error),
}

/// Result type alias for covpoint operations
pub type Result<T> = std::result::Result<T, CovError>;
