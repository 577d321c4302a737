//! Reconciliation: applies watcher notifications to the mirror.
//!
//! Events are processed one at a time, in arrival order. Failures of the
//! engine's own speculative fetches never escape this module; the worst
//! outcome is a `needs_refresh` flag that heals on the next expansion.

use std::path::Path;

use crate::models::{StatusEntry, TreeNode};
use crate::services::ports::watch::{ChangeEvent, ChangeKind};

use super::{FileTreeEngine, TreeEvent};

impl FileTreeEngine {
    /// Returns whether observable state changed.
    pub async fn apply_change(&self, change: ChangeEvent) -> bool {
        match change.kind {
            ChangeKind::Updated => false,
            ChangeKind::Added => self.apply_added(&change.location).await,
            ChangeKind::Deleted => self.apply_deleted(&change.location),
        }
    }

    async fn apply_added(&self, location: &Path) -> bool {
        let (parent_key, parent_generation) = {
            let mut guard = self.state();
            let st = &mut *guard;

            // Duplicate notifications must not create duplicate nodes.
            if st.status.contains_location(location) {
                return false;
            }
            let Some(name) = location.file_name() else {
                return false;
            };
            if self.config().is_ignored(&name.to_string_lossy()) {
                return false;
            }
            let Some(parent_path) = location.parent() else {
                return false;
            };
            // Parent subtree not materialized: a future expansion catches up.
            let Some((parent_key, parent_entry)) = st.status.entry_by_location(parent_path)
            else {
                return false;
            };
            let parent_node = parent_entry.node;
            let parent_expanded = parent_entry.expanded;
            let parent_generation = parent_entry.generation();

            if !st.tree.get(parent_node).is_some_and(|n| n.is_directory) {
                return false;
            }

            if !parent_expanded {
                if let Some(entry) = st.status.get_mut(&parent_key) {
                    entry.needs_refresh = true;
                }
                self.emit(TreeEvent::RefreshPending(parent_path.to_path_buf()));
                return true;
            }

            (parent_key, parent_generation)
        };

        let stat = match self.accessor().stat(location).await {
            Ok(stat) => stat,
            Err(e) => {
                // Entry vanished between notification and fetch.
                tracing::debug!(location = %location.display(), error = %e, "added entry vanished");
                return false;
            }
        };

        let mut guard = self.state();
        let st = &mut *guard;

        let (parent_id, still_current) = match st.status.get(&parent_key) {
            Some(entry) => (
                entry.node,
                entry.generation() == parent_generation && entry.expanded,
            ),
            None => return false,
        };
        if !still_current {
            // Stale fetch: the parent moved on while we were suspended. Flag
            // it so the next expansion refetches instead of losing the entry.
            tracing::debug!(location = %location.display(), "stale added fetch discarded");
            if let Some(entry) = st.status.get_mut(&parent_key) {
                entry.needs_refresh = true;
            }
            return true;
        }
        if st.status.contains_location(location) {
            return false;
        }

        let node = TreeNode::from_stat(&stat);
        let key = node.path_key();
        let id = st.tree.insert_child(parent_id, node);
        st.status.insert(key, StatusEntry::new(id));
        st.status.bump(&parent_key);

        self.emit(TreeEvent::NodeAdded(location.to_path_buf()));
        true
    }

    fn apply_deleted(&self, location: &Path) -> bool {
        let mut guard = self.state();
        let st = &mut *guard;

        let Some((_, entry)) = st.status.entry_by_location(location) else {
            return false;
        };
        let node_id = entry.node;

        if let Some(parent_id) = st.tree.parent(node_id) {
            let parent = st
                .tree
                .get(parent_id)
                .map(|n| (n.path_key(), n.location.clone()));
            if let Some((parent_key, parent_path)) = parent {
                if st.status.get(&parent_key).is_some_and(|e| !e.expanded) {
                    // Do not touch the child list of a collapsed directory;
                    // the next expansion refetches reality.
                    if let Some(parent_entry) = st.status.get_mut(&parent_key) {
                        parent_entry.needs_refresh = true;
                    }
                    self.emit(TreeEvent::RefreshPending(parent_path));
                    return true;
                }
                st.status.bump(&parent_key);
            }
        }

        st.purge_subtree(node_id);
        self.emit(TreeEvent::NodeRemoved(location.to_path_buf()));
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/reconcile.rs"]
mod tests;
