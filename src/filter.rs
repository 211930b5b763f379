//! Source path mangling boundary.
//!
//! The full include/exclude filtering lives outside this crate; the parser
//! only needs the path-mangling half, applied to every source path before
//! it reaches the line listeners. Mangling must be idempotent.

use std::path::{Component, Path, PathBuf};

/// Applies root-prefix rewriting and lexical path normalization.
pub trait SourcePathFilter {
    fn mangle_source_path(&self, path: &str) -> String;
}

/// Pass-through filter.
#[derive(Debug, Default, Clone)]
pub struct IdentityFilter;

impl SourcePathFilter for IdentityFilter {
    fn mangle_source_path(&self, path: &str) -> String {
        path.to_string()
    }
}

/// Rewrites an original root prefix to a new one and normalizes the
/// result lexically (collapses `.`, `..` and repeated separators).
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    orig_root: String,
    new_root: String,
}

impl PathFilter {
    pub fn new(orig_root: impl Into<String>, new_root: impl Into<String>) -> Self {
        Self {
            orig_root: orig_root.into(),
            new_root: new_root.into(),
        }
    }
}

impl SourcePathFilter for PathFilter {
    fn mangle_source_path(&self, path: &str) -> String {
        let mut out = normalize_lexically(path);

        if !self.orig_root.is_empty() && !self.new_root.is_empty() {
            if let Some(index) = out.find(&self.orig_root) {
                let mut replaced = out.clone();
                replaced.replace_range(index..index + self.orig_root.len(), &self.new_root);
                out = normalize_lexically(&replaced);
            }
        }

        out
    }
}

/// Collapse `.`, resolve `..` and squeeze repeated separators without
/// touching the filesystem.
fn normalize_lexically(path: &str) -> String {
    let p = Path::new(path);
    let mut out = PathBuf::new();

    for component in p.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep leading ".." for relative paths, pop otherwise
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }

    out.to_string_lossy().into_owned()
}
