//! Port implementations.

pub mod local;
pub mod memory;
pub mod watcher;

pub use local::LocalFileAccessor;
pub use memory::MemoryFileAccessor;
pub use watcher::NotifyWatchProvider;
