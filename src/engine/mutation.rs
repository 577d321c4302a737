//! User-initiated mutations: placeholders, create, rename, move, delete.
//!
//! Structural changes on disk are never mirrored speculatively: every
//! operation delegates to the accessor and lets the watcher's notifications
//! restructure the tree, keeping a single insertion/removal code path.

use std::path::{Path, PathBuf};

use crate::models::{StatusEntry, TreeNode};
use crate::services::ports::file::{FileError, Result as FileResult};

use super::{FileTreeEngine, TreeEvent};

/// Display name given to an unconfirmed placeholder entry.
pub const PLACEHOLDER_NAME: &str = ".untitled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Source and destination are the same path; only focus was transferred.
    SamePath,
    /// The destination already exists and the caller did not confirm an
    /// overwrite. No accessor call was made.
    Declined,
}

impl FileTreeEngine {
    /// Synthesizes a temporary placeholder under the directory owning
    /// `target` (the directory itself, or a file's parent), expanding it
    /// first when collapsed. Any previous placeholder under the same parent
    /// is replaced.
    pub async fn create_placeholder(
        &self,
        target: &Path,
        is_directory: bool,
    ) -> FileResult<PathBuf> {
        let (dir_path, dir_expanded) = {
            let guard = self.state();
            let st = &*guard;

            let Some((_, entry)) = st.status.entry_by_location(target) else {
                return Err(FileError::NotFound(target.to_path_buf()));
            };
            let Some(node) = st.tree.get(entry.node) else {
                return Err(FileError::NotFound(target.to_path_buf()));
            };

            if node.is_directory {
                (node.location.clone(), entry.expanded)
            } else {
                let Some(parent_id) = node.parent() else {
                    return Err(FileError::NotADirectory(target.to_path_buf()));
                };
                let Some(parent) = st.tree.get(parent_id) else {
                    return Err(FileError::NotFound(target.to_path_buf()));
                };
                let expanded = st
                    .status
                    .get(&parent.path_key())
                    .map(|e| e.expanded)
                    .unwrap_or(false);
                (parent.location.clone(), expanded)
            }
        };

        if !dir_expanded {
            // Forces materialization before the placeholder is appended.
            self.toggle_expand(&dir_path).await?;
        }

        let location = {
            let mut guard = self.state();
            let st = &mut *guard;

            let Some((dir_key, entry)) = st.status.entry_by_location(&dir_path) else {
                return Err(FileError::NotFound(dir_path));
            };
            let dir_id = entry.node;

            // At most one placeholder per parent.
            if let Some(existing) = st.tree.find_temporary_child(dir_id) {
                st.purge_subtree(existing);
            }

            let location = dir_path.join(PLACEHOLDER_NAME);
            if st.status.contains_location(&location) {
                return Err(FileError::AlreadyExists(location));
            }

            let mut node = TreeNode::new(location.clone(), is_directory);
            node.is_temporary = true;
            let key = node.path_key();
            let id = st.tree.insert_child(dir_id, node);
            st.status.insert(key, StatusEntry::new(id));
            st.status.bump(&dir_key);
            location
        };

        self.emit(TreeEvent::NodeAdded(location.clone()));
        Ok(location)
    }

    /// Confirms a placeholder with its final name. The placeholder is
    /// removed first; an empty or sentinel name cancels the creation. The
    /// confirmed node is materialized by the watcher's Added notification,
    /// never here, and the placeholder removal stands even when the
    /// accessor call fails.
    pub async fn confirm_placeholder(
        &self,
        placeholder: &Path,
        final_name: &str,
    ) -> FileResult<()> {
        let is_directory = {
            let mut guard = self.state();
            let st = &mut *guard;

            let Some((_, entry)) = st.status.entry_by_location(placeholder) else {
                return Ok(());
            };
            let node_id = entry.node;
            let (is_temporary, is_directory, parent_id) = match st.tree.get(node_id) {
                Some(n) => (n.is_temporary, n.is_directory, n.parent()),
                None => return Ok(()),
            };
            if !is_temporary {
                return Ok(());
            }
            if let Some(parent_id) = parent_id {
                if let Some(parent_key) = st.tree.get(parent_id).map(|n| n.path_key()) {
                    st.status.bump(&parent_key);
                }
            }
            st.purge_subtree(node_id);
            is_directory
        };
        self.emit(TreeEvent::NodeRemoved(placeholder.to_path_buf()));

        if final_name.is_empty() || final_name == PLACEHOLDER_NAME {
            return Ok(());
        }
        let Some(dir_path) = placeholder.parent() else {
            return Ok(());
        };
        let target = dir_path.join(final_name);
        if self.accessor().exists(&target).await {
            // An existing entry at the destination is left untouched.
            return Ok(());
        }
        self.accessor().create(&target, is_directory).await
    }

    /// Marks an entry as being renamed inline (temporary until committed).
    pub fn begin_rename(&self, location: &Path) -> bool {
        {
            let mut guard = self.state();
            let st = &mut *guard;
            let Some((_, entry)) = st.status.entry_by_location(location) else {
                return false;
            };
            let node_id = entry.node;
            match st.tree.get_mut(node_id) {
                Some(node) if !node.is_temporary => node.is_temporary = true,
                _ => return false,
            }
        }
        self.emit(TreeEvent::EntryUpdated(location.to_path_buf()));
        true
    }

    /// Clears the inline-rename mark and, when the name actually changed,
    /// delegates the rename to the accessor. The tree is restructured by the
    /// watcher's Deleted/Added pair.
    pub async fn commit_rename(&self, location: &Path, new_name: &str) -> FileResult<()> {
        let current_name = {
            let guard = self.state();
            let st = &*guard;
            let Some((_, entry)) = st.status.entry_by_location(location) else {
                return Ok(());
            };
            match st.tree.get(entry.node) {
                Some(node) => node.name.to_string(),
                None => return Ok(()),
            }
        };

        if !new_name.is_empty() && new_name != current_name {
            let Some(parent) = location.parent() else {
                return Ok(());
            };
            self.accessor()
                .move_entry(location, &parent.join(new_name))
                .await?;
        }

        {
            let mut guard = self.state();
            let st = &mut *guard;
            if let Some((_, entry)) = st.status.entry_by_location(location) {
                let node_id = entry.node;
                if let Some(node) = st.tree.get_mut(node_id) {
                    node.is_temporary = false;
                }
            }
        }
        self.emit(TreeEvent::EntryUpdated(location.to_path_buf()));
        Ok(())
    }

    /// Moves `from` into `to_directory`. A destination already present in
    /// the status table requires the caller to have confirmed the overwrite;
    /// declining performs no accessor call at all. Focus transfers to the
    /// destination eagerly even though the moved node arrives only with the
    /// watcher's notifications.
    pub async fn move_entry(
        &self,
        from: &Path,
        to_directory: &Path,
        overwrite: bool,
    ) -> FileResult<MoveOutcome> {
        let Some(name) = from.file_name() else {
            return Err(FileError::InvalidPath(from.display().to_string()));
        };
        let to = to_directory.join(name);

        let destination_known = {
            let mut guard = self.state();
            let st = &mut *guard;
            st.clear_selection_and_focus();

            if from == to {
                if let Some(key) = st.status.key_by_location(&to) {
                    if let Some(e) = st.status.get_mut(&key) {
                        e.focused = true;
                    }
                }
                drop(guard);
                self.emit(TreeEvent::SelectionChanged);
                return Ok(MoveOutcome::SamePath);
            }
            st.status.contains_location(&to)
        };
        self.emit(TreeEvent::SelectionChanged);

        if destination_known && !overwrite {
            return Ok(MoveOutcome::Declined);
        }

        self.accessor().move_entry(from, &to).await?;

        {
            let mut guard = self.state();
            let st = &mut *guard;
            if let Some(key) = st.status.key_by_location(&to) {
                if let Some(e) = st.status.get_mut(&key) {
                    e.focused = true;
                }
            }
        }
        self.emit(TreeEvent::SelectionChanged);
        Ok(MoveOutcome::Moved)
    }

    /// Creates an entry directly (no placeholder). An entry that already
    /// exists on disk is left untouched.
    pub async fn create_entry(&self, location: &Path, is_directory: bool) -> FileResult<()> {
        if self.accessor().exists(location).await {
            return Ok(());
        }
        self.accessor().create(location, is_directory).await
    }

    /// Deletes via the accessor only; tree removal happens through the
    /// resulting Deleted notification, never speculatively.
    pub async fn delete_entry(&self, location: &Path) -> FileResult<()> {
        self.accessor().delete(location).await
    }

    pub async fn delete_entries(&self, locations: &[PathBuf]) -> FileResult<()> {
        for location in locations {
            self.delete_entry(location).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/mutation.rs"]
mod tests;
