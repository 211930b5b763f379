//! Checksum database fallback.
//!
//! A persisted mapping from binary content identity to previously
//! discovered valid addresses, enabling coverage of symbol-less binaries.
//! This subsystem only reads it; ownership and persistence live with the
//! host.

use std::collections::HashMap;

/// Read-only lookup of historically valid addresses by content checksum.
pub trait ChecksumReader {
    /// Ordered sequence of known-good addresses, possibly empty.
    fn get(&self, checksum: u64) -> Vec<u64>;
}

/// Empty database; every lookup misses.
#[derive(Debug, Default)]
pub struct EmptyDatabase;

impl ChecksumReader for EmptyDatabase {
    fn get(&self, _checksum: u64) -> Vec<u64> {
        Vec::new()
    }
}

/// In-memory database, used by hosts that load persisted entries up front
/// and by tests.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    entries: HashMap<u64, Vec<u64>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, checksum: u64, addresses: Vec<u64>) {
        self.entries.insert(checksum, addresses);
    }
}

impl ChecksumReader for MemoryDatabase {
    fn get(&self, checksum: u64) -> Vec<u64> {
        self.entries.get(&checksum).cloned().unwrap_or_default()
    }
}
