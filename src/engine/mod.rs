//! The synchronization engine: shared tree/status state, lifecycle, and the
//! controllers split across submodules (reconcile, expansion, mutation,
//! selection).
//!
//! Locking model: all state lives behind one mutex that is never held across
//! an await. Every operation that suspends captures the relevant entry's
//! generation stamp first and re-validates it after resuming; stale writes
//! are discarded instead of applied.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use compact_str::CompactString;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::models::{NodeId, StatusEntry, StatusTable, TreeNode, WorkTree};
use crate::services::ports::file::{FileAccessor, FileError, Result as FileResult, Stat};
use crate::services::ports::watch::{WatchError, WatchProvider, WatchSubscription};
use crate::services::ports::workspace::{WorkspaceProvider, WorkspaceRoot};

mod expansion;
mod mutation;
mod reconcile;
mod selection;

pub use mutation::{MoveOutcome, PLACEHOLDER_NAME};

/// Fired whenever decoration-relevant state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    NodeAdded(PathBuf),
    NodeRemoved(PathBuf),
    EntryUpdated(PathBuf),
    DirectoryRefreshed(PathBuf),
    ExpansionChanged(PathBuf),
    RefreshPending(PathBuf),
    SelectionChanged,
    Reloaded,
}

#[derive(Debug)]
pub enum EngineError {
    File(FileError),
    Watch(WatchError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::File(e) => write!(f, "{}", e),
            EngineError::Watch(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<FileError> for EngineError {
    fn from(e: FileError) -> Self {
        EngineError::File(e)
    }
}

impl From<WatchError> for EngineError {
    fn from(e: WatchError) -> Self {
        EngineError::Watch(e)
    }
}

pub(crate) struct EngineState {
    pub(crate) tree: WorkTree,
    pub(crate) status: StatusTable,
}

impl EngineState {
    fn new() -> Self {
        Self {
            tree: WorkTree::new(),
            status: StatusTable::new(),
        }
    }

    /// Detaches `id` from its parent (or the root list) and removes the whole
    /// subtree from both the arena and the status table.
    pub(crate) fn purge_subtree(&mut self, id: NodeId) {
        if let Some(parent) = self.tree.parent(id) {
            self.tree.detach_child(parent, id);
        } else {
            self.tree.detach_root(id);
        }
        for key in self.tree.remove_subtree(id) {
            self.status.remove(&key);
        }
    }
}

struct EngineShared {
    state: Mutex<EngineState>,
    accessor: Arc<dyn FileAccessor>,
    config: EngineConfig,
    events: broadcast::Sender<TreeEvent>,
    watch_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for EngineShared {
    fn drop(&mut self) {
        if let Ok(tasks) = self.watch_tasks.get_mut() {
            for task in tasks.iter() {
                task.abort();
            }
        }
    }
}

/// Handle to the engine. Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct FileTreeEngine {
    shared: Arc<EngineShared>,
}

/// Snapshot of one entry's interaction flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFlags {
    pub selected: bool,
    pub focused: bool,
    pub expanded: bool,
    pub needs_refresh: bool,
}

/// One row of the flattened, expansion-aware view of the tree.
#[derive(Debug, Clone)]
pub struct TreeRow {
    pub location: PathBuf,
    pub name: CompactString,
    pub depth: u16,
    pub is_directory: bool,
    pub is_symbolic_link: bool,
    pub is_temporary: bool,
    pub expanded: bool,
    pub selected: bool,
    pub focused: bool,
}

impl FileTreeEngine {
    pub fn new(accessor: Arc<dyn FileAccessor>, config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            shared: Arc::new(EngineShared {
                state: Mutex::new(EngineState::new()),
                accessor,
                config,
                events,
                watch_tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.shared.events.subscribe()
    }

    pub(crate) fn accessor(&self) -> &Arc<dyn FileAccessor> {
        &self.shared.accessor
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, EngineState> {
        match self.shared.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn emit(&self, event: TreeEvent) {
        let _ = self.shared.events.send(event);
    }

    /// Tears down the mirror and rebuilds it from the given roots. Directory
    /// roots are materialized one level deep and start out expanded.
    pub async fn load_roots(&self, roots: &[WorkspaceRoot]) -> FileResult<()> {
        let mut loaded = Vec::with_capacity(roots.len());
        for root in roots {
            let children = if root.is_directory {
                let stat = Stat::new(root.location.clone(), true);
                Some(self.shared.accessor.list_children(&stat).await?)
            } else {
                None
            };
            loaded.push((root.clone(), children));
        }

        {
            let mut st = self.state();
            st.tree.clear();
            st.status.clear();
            for (root, children) in loaded {
                let node = TreeNode::new(root.location.clone(), root.is_directory);
                let key = node.path_key();
                let id = st.tree.insert_root(node);
                let entry = if root.is_directory {
                    StatusEntry::expanded(id)
                } else {
                    StatusEntry::new(id)
                };
                st.status.insert(key, entry);

                let Some(children) = children else { continue };
                for stat in children {
                    if self.shared.config.is_ignored(&stat.name()) {
                        continue;
                    }
                    let child = TreeNode::from_stat(&stat);
                    let child_key = child.path_key();
                    let child_id = st.tree.insert_child(id, child);
                    st.status.insert(child_key, StatusEntry::new(child_id));
                }
            }
        }
        self.emit(TreeEvent::Reloaded);
        Ok(())
    }

    /// Initial bring-up: load the provider's roots, then attach one watch
    /// subscription per root.
    pub async fn start(
        &self,
        workspace: &dyn WorkspaceProvider,
        watch: &dyn WatchProvider,
    ) -> Result<(), EngineError> {
        let roots = workspace.roots();
        self.load_roots(&roots).await?;
        for root in &roots {
            let subscription = watch.watch(&root.location)?;
            self.attach_watcher(subscription);
        }
        Ok(())
    }

    /// Full teardown and reload; the host calls this when the root set
    /// changes.
    pub async fn reload(
        &self,
        workspace: &dyn WorkspaceProvider,
        watch: &dyn WatchProvider,
    ) -> Result<(), EngineError> {
        self.detach_watchers();
        self.start(workspace, watch).await
    }

    /// Pumps a subscription's events into [`Self::apply_change`] on a
    /// background task, in arrival order.
    pub fn attach_watcher(&self, mut subscription: WatchSubscription) {
        let shared = Arc::downgrade(&self.shared);
        let task = tokio::spawn(async move {
            while let Some(change) = subscription.recv().await {
                let Some(shared) = shared.upgrade() else { break };
                let engine = FileTreeEngine { shared };
                engine.apply_change(change).await;
            }
        });
        if let Ok(mut tasks) = self.shared.watch_tasks.lock() {
            tasks.push(task);
        }
    }

    pub fn detach_watchers(&self) {
        if let Ok(mut tasks) = self.shared.watch_tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }

    pub fn clear(&self) {
        {
            let mut st = self.state();
            st.tree.clear();
            st.status.clear();
        }
        self.emit(TreeEvent::Reloaded);
    }

    pub fn contains(&self, location: &Path) -> bool {
        self.state().status.contains_location(location)
    }

    pub fn entry_count(&self) -> usize {
        self.state().status.len()
    }

    pub fn entry_flags(&self, location: &Path) -> Option<EntryFlags> {
        let st = self.state();
        let (_, entry) = st.status.entry_by_location(location)?;
        Some(EntryFlags {
            selected: entry.selected,
            focused: entry.focused,
            expanded: entry.expanded,
            needs_refresh: entry.needs_refresh,
        })
    }

    /// Locations of a directory's children, in display order.
    pub fn child_locations(&self, location: &Path) -> Vec<PathBuf> {
        let st = self.state();
        let Some((_, entry)) = st.status.entry_by_location(location) else {
            return Vec::new();
        };
        st.tree
            .children(entry.node)
            .iter()
            .filter_map(|&id| st.tree.get(id).map(|n| n.location.clone()))
            .collect()
    }

    /// Flattens the tree for display, honoring expansion state.
    pub fn rows(&self) -> Vec<TreeRow> {
        let st = self.state();
        let mut rows = Vec::new();
        let mut stack: Vec<(NodeId, u16)> =
            st.tree.roots().iter().rev().map(|&id| (id, 0)).collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = st.tree.get(id) else { continue };
            let entry = st.status.get(&node.path_key());
            let expanded = entry.map(|e| e.expanded).unwrap_or(false);
            rows.push(TreeRow {
                location: node.location.clone(),
                name: node.name.clone(),
                depth,
                is_directory: node.is_directory,
                is_symbolic_link: node.is_symbolic_link,
                is_temporary: node.is_temporary,
                expanded,
                selected: entry.map(|e| e.selected).unwrap_or(false),
                focused: entry.map(|e| e.focused).unwrap_or(false),
            });

            if node.is_directory && expanded {
                for &child in st.tree.children(id).iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }
        rows
    }
}
