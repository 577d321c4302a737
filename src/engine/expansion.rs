//! Expansion: lazy materialization of directory children.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::models::{NodeId, PathKey, StatusEntry, TreeNode};
use crate::services::ports::file::{Result as FileResult, Stat};

use super::{EngineState, FileTreeEngine, TreeEvent};

fn stat_for(node: &TreeNode) -> Stat {
    let mut stat = Stat::new(node.location.clone(), node.is_directory);
    stat.is_symbolic_link = node.is_symbolic_link;
    stat
}

impl FileTreeEngine {
    /// Expands or collapses a directory. The first expansion (or any
    /// expansion while `needs_refresh` is set) fetches the authoritative
    /// child set; collapsing keeps the children cached for instant
    /// re-expansion.
    pub async fn toggle_expand(&self, location: &Path) -> FileResult<bool> {
        let (key, generation, dir_stat) = {
            let mut guard = self.state();
            let st = &mut *guard;

            let Some((key, entry)) = st.status.entry_by_location(location) else {
                return Ok(false);
            };
            let node_id = entry.node;
            let expanded = entry.expanded;
            let needs_refresh = entry.needs_refresh;
            let generation = entry.generation();

            let Some(node) = st.tree.get(node_id) else {
                return Ok(false);
            };
            if !node.is_directory {
                return Ok(false);
            }
            let dir_stat = stat_for(node);

            if expanded {
                if let Some(e) = st.status.get_mut(&key) {
                    e.expanded = false;
                }
                st.status.bump(&key);
                self.emit(TreeEvent::ExpansionChanged(location.to_path_buf()));
                return Ok(true);
            }

            if !st.tree.children(node_id).is_empty() && !needs_refresh {
                if let Some(e) = st.status.get_mut(&key) {
                    e.expanded = true;
                }
                st.status.bump(&key);
                self.emit(TreeEvent::ExpansionChanged(location.to_path_buf()));
                return Ok(true);
            }

            (key, generation, dir_stat)
        };

        // The old child list is discarded only once the fresh one exists, so
        // a failed fetch leaves the cache and the collapsed state intact.
        let listing = self.accessor().list_children(&dir_stat).await?;

        let mut guard = self.state();
        let st = &mut *guard;
        match st.status.get(&key) {
            Some(entry) if entry.generation() == generation => {}
            _ => {
                tracing::debug!(location = %location.display(), "stale expand fetch discarded");
                return Ok(false);
            }
        }
        self.replace_children(st, &key, listing);
        if let Some(entry) = st.status.get_mut(&key) {
            entry.needs_refresh = false;
            entry.expanded = true;
        }
        st.status.bump(&key);
        drop(guard);

        self.emit(TreeEvent::DirectoryRefreshed(location.to_path_buf()));
        self.emit(TreeEvent::ExpansionChanged(location.to_path_buf()));
        Ok(true)
    }

    /// Collapses every directory entry, or, when `root` is given, that
    /// node's direct directory children (which are also flagged stale).
    pub fn collapse_all(&self, root: Option<&Path>) -> bool {
        let mut changed: Vec<PathBuf> = Vec::new();
        {
            let mut guard = self.state();
            let st = &mut *guard;

            match root {
                None => {
                    let keys: Vec<PathKey> = st
                        .status
                        .iter()
                        .filter(|(_, e)| e.expanded)
                        .map(|(k, _)| k.clone())
                        .collect();
                    for key in keys {
                        let Some(entry) = st.status.get(&key) else { continue };
                        let node_id = entry.node;
                        let Some(node) = st.tree.get(node_id) else { continue };
                        if !node.is_directory {
                            continue;
                        }
                        let path = node.location.clone();
                        if let Some(e) = st.status.get_mut(&key) {
                            e.expanded = false;
                        }
                        st.status.bump(&key);
                        changed.push(path);
                    }
                }
                Some(path) => {
                    let Some((_, entry)) = st.status.entry_by_location(path) else {
                        return false;
                    };
                    let child_ids = st.tree.children(entry.node).to_vec();
                    for id in child_ids {
                        let Some(node) = st.tree.get(id) else { continue };
                        if !node.is_directory {
                            continue;
                        }
                        let key = node.path_key();
                        let location = node.location.clone();
                        let Some(e) = st.status.get_mut(&key) else { continue };
                        let was_current = !e.expanded && e.needs_refresh;
                        e.expanded = false;
                        e.needs_refresh = true;
                        st.status.bump(&key);
                        if !was_current {
                            changed.push(location);
                        }
                    }
                }
            }
        }

        for path in &changed {
            self.emit(TreeEvent::ExpansionChanged(path.clone()));
        }
        !changed.is_empty()
    }

    /// Flags the whole materialized subtree stale; expanded descendants are
    /// refetched immediately, collapsed ones lazily on next expansion.
    pub async fn refresh_all(&self, location: &Path) -> FileResult<bool> {
        let targets = {
            let mut guard = self.state();
            let st = &mut *guard;

            let Some((_, entry)) = st.status.entry_by_location(location) else {
                return Ok(false);
            };
            let mut targets: Vec<(PathKey, u64, Stat, PathBuf)> = Vec::new();
            let mut stack = vec![entry.node];
            while let Some(id) = stack.pop() {
                let Some(node) = st.tree.get(id) else { continue };
                if !node.is_directory {
                    continue;
                }
                let key = node.path_key();
                let dir_stat = stat_for(node);
                let path = node.location.clone();
                stack.extend(st.tree.children(id).iter().copied());

                if let Some(e) = st.status.get_mut(&key) {
                    e.needs_refresh = true;
                    if e.expanded {
                        targets.push((key, e.generation(), dir_stat, path));
                    }
                }
            }
            targets
        };

        let mut changed = false;
        for (key, generation, dir_stat, path) in targets {
            let listing = match self.accessor().list_children(&dir_stat).await {
                Ok(listing) => listing,
                Err(e) => {
                    // Flag stays set; the subtree heals on next expansion.
                    tracing::warn!(path = %path.display(), error = %e, "refresh fetch failed");
                    continue;
                }
            };

            {
                let mut guard = self.state();
                let st = &mut *guard;
                match st.status.get(&key) {
                    Some(entry) if entry.generation() == generation && entry.expanded => {}
                    _ => continue,
                }
                self.replace_children(st, &key, listing);
                if let Some(e) = st.status.get_mut(&key) {
                    e.needs_refresh = false;
                }
                st.status.bump(&key);
            }
            self.emit(TreeEvent::DirectoryRefreshed(path));
            changed = true;
        }
        Ok(changed)
    }

    /// Replaces a directory's child list from a fresh listing. Children that
    /// survive (same path key) keep their node, subtree, and interaction
    /// state; vanished children are purged recursively; placeholders are
    /// carried over untouched. Runs entirely under the caller's lock.
    pub(crate) fn replace_children(
        &self,
        st: &mut EngineState,
        parent_key: &PathKey,
        listing: Vec<Stat>,
    ) {
        let Some(parent_entry) = st.status.get(parent_key) else {
            return;
        };
        let parent_id = parent_entry.node;

        let child_ids = st.tree.children(parent_id).to_vec();
        let mut existing: FxHashMap<PathKey, NodeId> = FxHashMap::default();
        let mut temporaries: Vec<NodeId> = Vec::new();
        for id in child_ids {
            let Some(node) = st.tree.get(id) else { continue };
            if node.is_temporary {
                temporaries.push(id);
            } else {
                existing.insert(node.path_key(), id);
            }
        }

        let mut next: Vec<NodeId> = Vec::with_capacity(listing.len() + temporaries.len());
        for stat in listing {
            if self.config().is_ignored(&stat.name()) {
                continue;
            }
            let key = stat.path_key();
            if let Some(id) = existing.remove(&key) {
                next.push(id);
            } else {
                let node = TreeNode::from_stat(&stat);
                let id = st.tree.insert_child(parent_id, node);
                st.status.insert(key, StatusEntry::new(id));
                next.push(id);
            }
        }
        next.extend(temporaries);

        for (_, vanished) in existing {
            st.purge_subtree(vanished);
        }

        st.tree.set_children(parent_id, next);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/expansion.rs"]
mod tests;
