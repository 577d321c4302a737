//! Canonical node identity for status-table lookups.

use std::fmt;
use std::path::Path;

/// Suffix appended to the location of symbolic-link nodes so that a link and
/// its target never collide in the status table.
const SYMLINK_MARKER: &str = "#";

/// Canonical identity of a tree node: its location string, plus a marker for
/// symbolic links.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathKey(String);

impl PathKey {
    pub fn new(location: &Path, is_symbolic_link: bool) -> Self {
        let mut key = location.to_string_lossy().into_owned();
        if is_symbolic_link {
            key.push_str(SYMLINK_MARKER);
        }
        Self(key)
    }

    /// Key for a plain (non-symlink) entry at `location`.
    pub fn plain(location: &Path) -> Self {
        Self::new(location, false)
    }

    /// Key for a symbolic-link entry at `location`.
    pub fn symlink(location: &Path) -> Self {
        Self::new(location, true)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
