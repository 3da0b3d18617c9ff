//! Path and segment model.
//!
//! Everything above this module reasons about device paths as ordered
//! segment lists relative to some root, so prefix/ancestor tests and
//! case-(in)sensitive comparisons live here. Two paths from different
//! backends (direct filesystem vs. shell-mediated) never compare equal
//! except through explicit segment equality.

mod gateway;

pub use gateway::{FileGateway, GatewayError, LocalGateway};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::SystemTime;

/// Ordered, non-empty path components relative to some root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Segments(Vec<String>);

impl Segments {
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts.into_iter().filter(|p| !p.is_empty()).collect())
    }

    /// Parse a `/`-separated string, dropping empty components.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split('/').map(str::to_string).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Join into a `/`-separated relative path.
    pub fn join(&self) -> String {
        self.0.join("/")
    }

    pub fn lowercase(&self) -> Segments {
        Segments(self.0.iter().map(|s| s.to_lowercase()).collect())
    }

    pub fn child(&self, name: &str) -> Segments {
        let mut parts = self.0.clone();
        parts.extend(name.split('/').filter(|p| !p.is_empty()).map(str::to_string));
        Segments(parts)
    }

    pub fn append(&self, other: &Segments) -> Segments {
        let mut parts = self.0.clone();
        parts.extend(other.0.iter().cloned());
        Segments(parts)
    }

    /// Exact match: same length, all segments equal under the case rule.
    pub fn matches(&self, other: &Segments, ignore_case: bool) -> bool {
        self.0.len() == other.0.len() && self.starts_with(other, ignore_case)
    }

    /// Segment-wise prefix test.
    pub fn starts_with(&self, prefix: &Segments, ignore_case: bool) -> bool {
        if prefix.0.len() > self.0.len() {
            return false;
        }
        self.0
            .iter()
            .zip(prefix.0.iter())
            .all(|(a, b)| seg_eq(a, b, ignore_case))
    }

    /// Contiguous subsequence test.
    ///
    /// With `allow_partial` the comparison degrades to substring containment
    /// over the joined path, so `other` may start or end mid-segment.
    pub fn contains_segments(&self, other: &Segments, ignore_case: bool, allow_partial: bool) -> bool {
        if other.0.is_empty() {
            return true;
        }
        if allow_partial {
            let haystack = self.join();
            let needle = other.join();
            return if ignore_case {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            } else {
                haystack.contains(&needle)
            };
        }
        if other.0.len() > self.0.len() {
            return false;
        }
        self.0.windows(other.0.len()).any(|window| {
            window
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| seg_eq(a, b, ignore_case))
        })
    }

    /// Drop the first `count` segments.
    pub fn drop_prefix(&self, count: usize) -> Segments {
        Segments(self.0.iter().skip(count).cloned().collect())
    }
}

impl fmt::Display for Segments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.join())
    }
}

impl<const N: usize> From<[&str; N]> for Segments {
    fn from(parts: [&str; N]) -> Self {
        Segments::new(parts.iter().map(|s| s.to_string()).collect())
    }
}

pub(crate) fn seg_eq(a: &str, b: &str, ignore_case: bool) -> bool {
    if !ignore_case {
        return a == b;
    }
    // Folding can change the byte length (U+212A lowercases to "k"), so
    // compare the folded character streams rather than pre-checking len.
    a.chars()
        .flat_map(|c| c.to_lowercase())
        .eq(b.chars().flat_map(|c| c.to_lowercase()))
}

/// Which I/O backend produced a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Directly accessible filesystem.
    Local,
    /// Root/shell-mediated access.
    Shell,
}

/// An absolute device location plus its segment decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualPath {
    backend: Backend,
    segments: Segments,
}

impl VirtualPath {
    pub fn local(raw: &str) -> Self {
        Self {
            backend: Backend::Local,
            segments: Segments::parse(raw),
        }
    }

    pub fn shell(raw: &str) -> Self {
        Self {
            backend: Backend::Shell,
            segments: Segments::parse(raw),
        }
    }

    pub fn from_std(path: &Path) -> Self {
        Self::local(&path.to_string_lossy())
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn segments(&self) -> &Segments {
        &self.segments
    }

    /// Last segment, or empty for the filesystem root.
    pub fn name(&self) -> &str {
        self.segments.as_slice().last().map(String::as_str).unwrap_or("")
    }

    pub fn raw(&self) -> String {
        format!("/{}", self.segments.join())
    }

    pub fn as_std_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(self.raw())
    }

    pub fn child(&self, name: &str) -> VirtualPath {
        VirtualPath {
            backend: self.backend,
            segments: self.segments.child(name),
        }
    }

    /// True ancestor test: same backend, strictly shorter, segment prefix.
    pub fn is_ancestor_of(&self, other: &VirtualPath) -> bool {
        self.backend == other.backend
            && self.segments.len() < other.segments.len()
            && other.segments.starts_with(&self.segments, false)
    }

    pub fn is_descendant_of(&self, other: &VirtualPath) -> bool {
        other.is_ancestor_of(self)
    }

    pub fn is_parent_of(&self, other: &VirtualPath) -> bool {
        self.is_ancestor_of(other) && other.segments.len() == self.segments.len() + 1
    }

    /// Segments of `self` relative to `prefix`, if `prefix` is an ancestor.
    pub fn remove_prefix(&self, prefix: &VirtualPath) -> Option<Segments> {
        if !prefix.is_ancestor_of(self) {
            return None;
        }
        Some(self.segments.drop_prefix(prefix.segments.len()))
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Filesystem entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Directory,
    SymbolicLink,
    File,
}

/// Stat result for a path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLookup {
    pub path: VirtualPath,
    pub file_type: FileType,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl PathLookup {
    pub fn segments(&self) -> &Segments {
        self.path.segments()
    }

    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }
}
