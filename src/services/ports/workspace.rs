//! Workspace-root discovery port.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoot {
    pub location: PathBuf,
    pub is_directory: bool,
}

impl WorkspaceRoot {
    pub fn directory(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            is_directory: true,
        }
    }
}

/// Supplies the current root set. When the host learns that the set changed,
/// it calls [`crate::engine::FileTreeEngine::reload`].
pub trait WorkspaceProvider: Send + Sync {
    fn roots(&self) -> Vec<WorkspaceRoot>;
}

/// Fixed root set, known at construction time.
pub struct StaticWorkspace {
    roots: Vec<WorkspaceRoot>,
}

impl StaticWorkspace {
    pub fn new(roots: Vec<WorkspaceRoot>) -> Self {
        Self { roots }
    }

    pub fn single_directory(location: impl Into<PathBuf>) -> Self {
        Self::new(vec![WorkspaceRoot::directory(location)])
    }
}

impl WorkspaceProvider for StaticWorkspace {
    fn roots(&self) -> Vec<WorkspaceRoot> {
        self.roots.clone()
    }
}
