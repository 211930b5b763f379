//! Instruction-boundary verification boundary.
//!
//! Real verification disassembles the segment bytes to check that a
//! candidate address falls on an instruction start; that machinery lives
//! outside this crate. The parser only drives the trait.

/// Checks whether addresses fall on real instruction boundaries.
pub trait AddressVerifier {
    /// Called once per scanned binary with the raw file image and the
    /// offset where the identification bytes end.
    fn setup(&mut self, file_image: &[u8], ident_size: usize);

    /// Check one address, given the byte copy of the containing segment
    /// and the address's offset relative to the segment base.
    fn verify(&self, segment_bytes: &[u8], offset: u64) -> bool;
}

/// Verifier that accepts every in-segment address.
#[derive(Debug, Default)]
pub struct AcceptAll;

impl AddressVerifier for AcceptAll {
    fn setup(&mut self, _file_image: &[u8], _ident_size: usize) {}

    fn verify(&self, _segment_bytes: &[u8], _offset: u64) -> bool {
        true
    }
}
