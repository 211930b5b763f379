//! Run configuration.
//!
//! The original design read these switches from a process-wide singleton;
//! here they are an explicit value passed into the parser constructor.

use std::path::PathBuf;

/// Configuration for one parsing run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Check candidate addresses against the instruction-boundary verifier
    pub verify_addresses: bool,
    /// Track dependent shared libraries; a PIE main binary defers parsing
    /// until the tracer reports its load offset
    pub trace_dependents: bool,
    /// Scan read-only data for legacy coverage side-file names
    pub legacy_coverage: bool,
    /// Root for the build-id debug file convention
    pub build_id_root: PathBuf,
    /// Root mirrored under the binary's real directory for debug links
    pub debug_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verify_addresses: false,
            trace_dependents: true,
            legacy_coverage: false,
            build_id_root: PathBuf::from("/usr/lib/debug/.build-id"),
            debug_root: PathBuf::from("/usr/lib/debug"),
        }
    }
}
