//! Interaction and lifecycle state per node, keyed by [`PathKey`].
//!
//! The table is the single authoritative index over the tree: hot-path
//! lookups go through it, never by traversal from a root.

use std::path::Path;

use rustc_hash::FxHashMap;

use super::path_key::PathKey;
use super::tree::NodeId;

/// Per-node interaction state. `expanded` is meaningful for directories
/// only. The generation stamp is bumped on every expansion-state or
/// child-list mutation and is validated after each suspension point.
#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub node: NodeId,
    pub selected: bool,
    pub focused: bool,
    pub expanded: bool,
    pub needs_refresh: bool,
    generation: u64,
}

impl StatusEntry {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            selected: false,
            focused: false,
            expanded: false,
            needs_refresh: false,
            generation: 0,
        }
    }

    /// Entry for a node that starts out expanded (workspace roots).
    pub fn expanded(node: NodeId) -> Self {
        let mut entry = Self::new(node);
        entry.expanded = true;
        entry
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Default)]
pub struct StatusTable {
    entries: FxHashMap<PathKey, StatusEntry>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PathKey, entry: StatusEntry) {
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &PathKey) -> Option<&StatusEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &PathKey) -> Option<&mut StatusEntry> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &PathKey) -> Option<StatusEntry> {
        self.entries.remove(key)
    }

    /// Looks a location up under both key forms (plain first, then the
    /// symlink-marked variant).
    pub fn key_by_location(&self, location: &Path) -> Option<PathKey> {
        let plain = PathKey::plain(location);
        if self.entries.contains_key(&plain) {
            return Some(plain);
        }
        let link = PathKey::symlink(location);
        if self.entries.contains_key(&link) {
            return Some(link);
        }
        None
    }

    pub fn entry_by_location(&self, location: &Path) -> Option<(PathKey, &StatusEntry)> {
        let key = self.key_by_location(location)?;
        let entry = self.entries.get(&key)?;
        Some((key, entry))
    }

    pub fn contains_location(&self, location: &Path) -> bool {
        self.key_by_location(location).is_some()
    }

    /// Advances the generation stamp, invalidating in-flight fetches that
    /// captured the previous value.
    pub fn bump(&mut self, key: &PathKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.generation = entry.generation.wrapping_add(1);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathKey, &StatusEntry)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&PathKey, &mut StatusEntry)> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
