//! Service ports: traits + data contracts.

pub mod file;
pub mod watch;
pub mod workspace;

pub use file::{BoxFuture, FileAccessor, FileError, Result as FileResult, Stat};
pub use watch::{ChangeEvent, ChangeKind, WatchError, WatchProvider, WatchSubscription};
pub use workspace::{StaticWorkspace, WorkspaceProvider, WorkspaceRoot};
