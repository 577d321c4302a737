//! Selection and focus over the status table.
//!
//! Selection and focus are independent flags that commonly co-occur:
//! selecting also focuses, but focusing alone preserves selection.

use std::path::{Path, PathBuf};

use crate::models::PathKey;

use super::{EngineState, FileTreeEngine, TreeEvent};

impl EngineState {
    pub(crate) fn clear_selection_and_focus(&mut self) -> bool {
        let mut changed = false;
        for (_, entry) in self.status.iter_mut() {
            if entry.selected || entry.focused {
                entry.selected = false;
                entry.focused = false;
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn clear_focus(&mut self) -> bool {
        let mut changed = false;
        for (_, entry) in self.status.iter_mut() {
            if entry.focused {
                entry.focused = false;
                changed = true;
            }
        }
        changed
    }
}

impl FileTreeEngine {
    /// Selects (and focuses) the given entries, clearing the previous
    /// selection first. An empty slice degrades to clearing focus only,
    /// the ctrl/cmd-click deselection convention.
    pub fn set_selected(&self, locations: &[PathBuf], value: bool) -> bool {
        let changed = {
            let mut guard = self.state();
            let st = &mut *guard;

            if locations.is_empty() {
                st.clear_focus()
            } else {
                let mut changed = st.clear_selection_and_focus();
                for location in locations {
                    let Some(key) = st.status.key_by_location(location) else {
                        continue;
                    };
                    if let Some(entry) = st.status.get_mut(&key) {
                        entry.selected = value;
                        entry.focused = value;
                        changed = true;
                    }
                }
                changed
            }
        };
        if changed {
            self.emit(TreeEvent::SelectionChanged);
        }
        changed
    }

    /// Focuses the given entries, preserving the selection.
    pub fn set_focused(&self, locations: &[PathBuf], value: bool) -> bool {
        let changed = {
            let mut guard = self.state();
            let st = &mut *guard;
            let mut changed = st.clear_focus();
            for location in locations {
                let Some(key) = st.status.key_by_location(location) else {
                    continue;
                };
                if let Some(entry) = st.status.get_mut(&key) {
                    entry.focused = value;
                    changed = true;
                }
            }
            changed
        };
        if changed {
            self.emit(TreeEvent::SelectionChanged);
        }
        changed
    }

    pub fn is_selected(&self) -> bool {
        self.state().status.iter().any(|(_, e)| e.selected)
    }

    pub fn is_focused(&self) -> bool {
        self.state().status.iter().any(|(_, e)| e.focused)
    }

    pub fn focused_paths(&self) -> Vec<PathBuf> {
        let st = self.state();
        st.status
            .iter()
            .filter(|(_, e)| e.focused)
            .filter_map(|(_, e)| st.tree.get(e.node).map(|n| n.location.clone()))
            .collect()
    }

    pub fn selected_keys(&self) -> Vec<PathKey> {
        self.state()
            .status
            .iter()
            .filter(|(_, e)| e.selected)
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/selection.rs"]
mod tests;
