//! File-access port: trait + data contracts.
//!
//! Methods return boxed futures so the trait stays object-safe; adapters
//! decide how (and whether) the work actually suspends.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::SystemTime;

use compact_str::{CompactString, ToCompactString};

use crate::models::PathKey;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug)]
pub enum FileError {
    Io(io::Error),
    NotFound(PathBuf),
    AlreadyExists(PathBuf),
    NotADirectory(PathBuf),
    NotAFile(PathBuf),
    PermissionDenied(PathBuf),
    InvalidPath(String),
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::Io(e) => write!(f, "IO error: {}", e),
            FileError::NotFound(p) => write!(f, "Not found: {}", p.display()),
            FileError::AlreadyExists(p) => write!(f, "Already exists: {}", p.display()),
            FileError::NotADirectory(p) => write!(f, "Not a directory: {}", p.display()),
            FileError::NotAFile(p) => write!(f, "Not a file: {}", p.display()),
            FileError::PermissionDenied(p) => write!(f, "Permission denied: {}", p.display()),
            FileError::InvalidPath(s) => write!(f, "Invalid path: {}", s),
        }
    }
}

impl std::error::Error for FileError {}

impl From<io::Error> for FileError {
    fn from(e: io::Error) -> Self {
        FileError::Io(e)
    }
}

/// Snapshot of one file-system entry as reported by an accessor.
#[derive(Debug, Clone)]
pub struct Stat {
    pub location: PathBuf,
    pub is_directory: bool,
    pub is_symbolic_link: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl Stat {
    pub fn new(location: PathBuf, is_directory: bool) -> Self {
        Self {
            location,
            is_directory,
            is_symbolic_link: false,
            size: 0,
            modified: None,
        }
    }

    pub fn name(&self) -> CompactString {
        self.location
            .file_name()
            .map(|n| n.to_string_lossy().to_compact_string())
            .unwrap_or_else(|| self.location.to_string_lossy().to_compact_string())
    }

    pub fn path_key(&self) -> PathKey {
        PathKey::new(&self.location, self.is_symbolic_link)
    }
}

/// Everything the engine needs from the underlying file system. Calls
/// suspend; timeouts are owned by the implementation, not by the engine.
pub trait FileAccessor: Send + Sync {
    fn stat(&self, location: &Path) -> BoxFuture<Result<Stat>>;

    /// Children of a directory. Ordering is not guaranteed; the engine
    /// re-sorts.
    fn list_children(&self, dir: &Stat) -> BoxFuture<Result<Vec<Stat>>>;

    fn create(&self, location: &Path, is_directory: bool) -> BoxFuture<Result<()>>;

    fn delete(&self, location: &Path) -> BoxFuture<Result<()>>;

    fn move_entry(&self, from: &Path, to: &Path) -> BoxFuture<Result<()>>;

    fn exists(&self, location: &Path) -> BoxFuture<bool>;
}
