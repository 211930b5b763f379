//! Address validation and translation bridge.
//!
//! Every (file, line, address) candidate from the chosen line source
//! runs through here: containment check against the scanned executable
//! segments, optional instruction-boundary verification, translation
//! through the declared runtime layout, relocation, path mangling, and
//! finally fanout to the line listeners.

use tracing::debug;

use super::ElfParser;

impl ElfParser {
    /// Validate, translate and forward one candidate coverage point.
    pub(super) fn emit_line(&mut self, file: &str, line: u32, addr: u64) {
        if !self.address_is_valid(addr) {
            return;
        }

        let mangled = self.filter.mangle_source_path(file);
        let translated = self.adjust_address_by_segment(addr) + self.relocation;

        for listener in &mut self.line_listeners {
            listener.on_line(&mangled, line, translated);
        }
    }

    /// An address is instrumentable when a scanned executable segment
    /// contains it and, if enabled, the verifier accepts it as an
    /// instruction boundary.
    fn address_is_valid(&mut self, addr: u64) -> bool {
        let Some(seg) = self.exec_segments.iter().find(|s| s.contains(addr)) else {
            return false;
        };

        if self.config.verify_addresses {
            let offset = addr - seg.base();
            if !self.verifier.verify(seg.data(), offset) {
                debug!(
                    "address {:#x} is not at an instruction boundary, skipping",
                    addr
                );
                self.invalid_breakpoints += 1;
                return false;
            }
        }

        true
    }

    /// Translate through the first declared segment containing the
    /// address; identity when no declared segment contains it.
    fn adjust_address_by_segment(&self, addr: u64) -> u64 {
        for seg in &self.declared_segments {
            if seg.contains(addr) {
                return seg.translate(addr);
            }
        }

        addr
    }
}
