//! Contiguous addressable byte ranges.
//!
//! A segment carries a file-relative (physical) base, a runtime (virtual)
//! base and a size. Declared segments come from a live process's actual
//! load layout and carry no bytes; scanned segments come from the file's
//! own executable section headers and keep a byte copy for
//! instruction-boundary verification.

/// Holder for one address segment.
#[derive(Debug, Clone)]
pub struct Segment {
    paddr: u64,
    vaddr: u64,
    size: u64,
    data: Option<Vec<u8>>,
}

impl Segment {
    /// A segment from a process's load layout, used purely for
    /// containment and translation.
    pub fn declared(paddr: u64, vaddr: u64, size: u64) -> Self {
        Self {
            paddr,
            vaddr,
            size,
            data: None,
        }
    }

    /// A segment scanned from the file's section headers, carrying a
    /// byte copy.
    pub fn scanned(paddr: u64, vaddr: u64, size: u64, data: Vec<u8>) -> Self {
        Self {
            paddr,
            vaddr,
            size,
            data: Some(data),
        }
    }

    /// Check if an address is contained within this segment. Written
    /// subtractively so a segment ending at the top of the address space
    /// cannot overflow.
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.paddr && addr - self.paddr < self.size
    }

    /// Adjust an address with the segment: `addr - paddr + vaddr` when
    /// contained, identity otherwise.
    pub fn translate(&self, addr: u64) -> u64 {
        if self.contains(addr) {
            addr - self.paddr + self.vaddr
        } else {
            addr
        }
    }

    pub fn base(&self) -> u64 {
        self.paddr
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Raw byte copy for scanned segments, empty for declared ones.
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containment() {
        let seg = Segment::declared(0x1000, 0x5000, 0x100);
        assert!(seg.contains(0x1000));
        assert!(seg.contains(0x10ff));
        assert!(!seg.contains(0x0fff));
        assert!(!seg.contains(0x1100));
    }

    #[test]
    fn test_translation() {
        let seg = Segment::declared(0x1000, 0x5000, 0x100);
        assert_eq!(seg.translate(0x1000), 0x5000);
        assert_eq!(seg.translate(0x1042), 0x5042);
        // Outside the segment translation is identity
        assert_eq!(seg.translate(0x2000), 0x2000);
    }

    #[test]
    fn test_containment_at_top_of_address_space() {
        let seg = Segment::scanned(u64::MAX - 0x10, u64::MAX - 0x10, 0x100, vec![0; 0x11]);
        assert!(seg.contains(u64::MAX - 0x8));
        assert!(seg.contains(u64::MAX));
        assert!(!seg.contains(u64::MAX - 0x11));
    }

    #[test]
    fn test_scanned_keeps_bytes() {
        let seg = Segment::scanned(0x400, 0x400, 4, vec![0x90, 0x90, 0xc3, 0x00]);
        assert_eq!(seg.data(), &[0x90, 0x90, 0xc3, 0x00]);
        assert!(Segment::declared(0, 0, 4).data().is_empty());
    }
}
