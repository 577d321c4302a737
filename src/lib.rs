//! treesync: workspace file-tree synchronization engine.
//!
//! Mirrors an external directory hierarchy in memory for an editor
//! workspace and keeps the mirror consistent with an asynchronous stream of
//! change notifications, while composing with user-driven mutations
//! (expand/collapse, create, rename, move, delete, selection).
//!
//! Module structure:
//! - models: node arena, path keys, status table
//! - services: ports (FileAccessor, WatchProvider, WorkspaceProvider) and
//!   their adapters (local fs, in-memory, notify)
//! - engine: reconciliation, expansion, mutation, selection over the shared
//!   state

pub mod config;
pub mod engine;
pub mod logging;
pub mod models;
pub mod services;

pub use config::EngineConfig;
pub use engine::{
    EngineError, EntryFlags, FileTreeEngine, MoveOutcome, TreeEvent, TreeRow, PLACEHOLDER_NAME,
};
pub use models::{compare_names, NodeId, PathKey, StatusEntry, StatusTable, TreeNode, WorkTree};
pub use services::adapters::{LocalFileAccessor, MemoryFileAccessor, NotifyWatchProvider};
pub use services::ports::{
    BoxFuture, ChangeEvent, ChangeKind, FileAccessor, FileError, FileResult, StaticWorkspace,
    Stat, WatchError, WatchProvider, WatchSubscription, WorkspaceProvider, WorkspaceRoot,
};
