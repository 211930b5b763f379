//! Listener traits and file discovery types.
//!
//! This is the main way the (file, line) -> address map leaves the
//! subsystem: every validated, translated coverage point is fanned out to
//! the registered line listeners, and every discovered binary or side-data
//! file to the file listeners, in registration order.

use std::path::{Path, PathBuf};

/// Classification of a discovered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFlags {
    /// The main binary
    None,
    /// A dependent shared library
    SharedLibrary,
    /// Legacy coverage side data discovered inside a binary
    CoverageSideData,
}

/// A discovered file (typically an ELF binary) with its content checksum.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub checksum: u64,
    pub flags: FileFlags,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, checksum: u64, flags: FileFlags) -> Self {
        Self {
            path: path.into(),
            checksum,
            flags,
        }
    }
}

/// Listener for source lines.
///
/// Invoked once per validated, translated coverage point.
pub trait LineListener {
    fn on_line(&mut self, file: &str, line: u32, addr: u64);
}

/// Listener for discovered files.
pub trait FileListener {
    fn on_file(&mut self, file: &SourceFile);
}

/// Shared recording listener, handy for hosts that collect points into a
/// common store while keeping a handle for later inspection.
#[derive(Default, Clone)]
pub struct RecordingListener {
    inner: std::rc::Rc<std::cell::RefCell<Recorded>>,
}

#[derive(Default)]
struct Recorded {
    lines: Vec<(String, u32, u64)>,
    files: Vec<SourceFile>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(String, u32, u64)> {
        self.inner.borrow().lines.clone()
    }

    pub fn files(&self) -> Vec<SourceFile> {
        self.inner.borrow().files.clone()
    }

    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.inner
            .borrow()
            .files
            .iter()
            .map(|f| f.path.clone())
            .collect()
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.inner.borrow().files.iter().any(|f| f.path == path)
    }
}

impl LineListener for RecordingListener {
    fn on_line(&mut self, file: &str, line: u32, addr: u64) {
        self.inner
            .borrow_mut()
            .lines
            .push((file.to_string(), line, addr));
    }
}

impl FileListener for RecordingListener {
    fn on_file(&mut self, file: &SourceFile) {
        self.inner.borrow_mut().files.push(file.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_listener_shares_state() {
        let recorder = RecordingListener::new();
        let mut handle = recorder.clone();

        handle.on_line("a.c", 10, 0x1000);
        handle.on_file(&SourceFile::new("/bin/a", 42, FileFlags::None));

        assert_eq!(recorder.lines(), vec![("a.c".to_string(), 10, 0x1000)]);
        assert_eq!(recorder.files().len(), 1);
        assert_eq!(recorder.files()[0].checksum, 42);
        assert!(recorder.has_file(Path::new("/bin/a")));
    }
}
