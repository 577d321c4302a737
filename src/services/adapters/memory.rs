//! In-memory file accessor for tests and headless sessions.
//!
//! Keeps a flat map of paths, counts every operation, and can be switched
//! to deny writes so failure paths are exercisable without a real disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::services::ports::file::{BoxFuture, FileAccessor, FileError, Result, Stat};

#[derive(Debug, Clone, Copy)]
struct MemEntry {
    is_directory: bool,
    is_symbolic_link: bool,
}

#[derive(Default)]
pub struct MemoryFileAccessor {
    entries: Mutex<BTreeMap<PathBuf, MemEntry>>,
    deny_writes: AtomicBool,
    stat_calls: AtomicUsize,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    move_calls: AtomicUsize,
}

impl MemoryFileAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, location: impl Into<PathBuf>) {
        self.add(location.into(), true, false);
    }

    pub fn add_file(&self, location: impl Into<PathBuf>) {
        self.add(location.into(), false, false);
    }

    pub fn add_symlink_dir(&self, location: impl Into<PathBuf>) {
        self.add(location.into(), true, true);
    }

    fn add(&self, location: PathBuf, is_directory: bool, is_symbolic_link: bool) {
        let mut entries = self.lock_entries();
        entries.insert(
            location,
            MemEntry {
                is_directory,
                is_symbolic_link,
            },
        );
    }

    /// Simulates an external delete: the path (and any descendants) stop
    /// existing without any notification being produced.
    pub fn remove_path(&self, location: &Path) {
        let mut entries = self.lock_entries();
        entries.retain(|path, _| path != location && !path.starts_with(location));
    }

    pub fn set_deny_writes(&self, deny: bool) {
        self.deny_writes.store(deny, Ordering::SeqCst);
    }

    pub fn stat_calls(&self) -> usize {
        self.stat_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn move_calls(&self) -> usize {
        self.move_calls.load(Ordering::SeqCst)
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, MemEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_denied(&self, location: &Path) -> Option<FileError> {
        if self.deny_writes.load(Ordering::SeqCst) {
            Some(FileError::PermissionDenied(location.to_path_buf()))
        } else {
            None
        }
    }

    fn stat_of(&self, location: &Path) -> Result<Stat> {
        let entries = self.lock_entries();
        let entry = entries
            .get(location)
            .ok_or_else(|| FileError::NotFound(location.to_path_buf()))?;
        Ok(Stat {
            location: location.to_path_buf(),
            is_directory: entry.is_directory,
            is_symbolic_link: entry.is_symbolic_link,
            size: 0,
            modified: None,
        })
    }
}

fn ready<T: Send + 'static>(value: T) -> BoxFuture<T> {
    Box::pin(async move { value })
}

impl FileAccessor for MemoryFileAccessor {
    fn stat(&self, location: &Path) -> BoxFuture<Result<Stat>> {
        self.stat_calls.fetch_add(1, Ordering::SeqCst);
        ready(self.stat_of(location))
    }

    fn list_children(&self, dir: &Stat) -> BoxFuture<Result<Vec<Stat>>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let result = (|| {
            if !dir.is_directory {
                return Err(FileError::NotADirectory(dir.location.clone()));
            }
            let entries = self.lock_entries();
            if !entries.contains_key(&dir.location) {
                return Err(FileError::NotFound(dir.location.clone()));
            }
            let children = entries
                .iter()
                .filter(|(path, _)| path.parent() == Some(dir.location.as_path()))
                .map(|(path, entry)| Stat {
                    location: path.clone(),
                    is_directory: entry.is_directory,
                    is_symbolic_link: entry.is_symbolic_link,
                    size: 0,
                    modified: None,
                })
                .collect();
            Ok(children)
        })();
        ready(result)
    }

    fn create(&self, location: &Path, is_directory: bool) -> BoxFuture<Result<()>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let result = (|| {
            if let Some(err) = self.write_denied(location) {
                return Err(err);
            }
            let mut entries = self.lock_entries();
            if entries.contains_key(location) {
                return Err(FileError::AlreadyExists(location.to_path_buf()));
            }
            entries.insert(
                location.to_path_buf(),
                MemEntry {
                    is_directory,
                    is_symbolic_link: false,
                },
            );
            Ok(())
        })();
        ready(result)
    }

    fn delete(&self, location: &Path) -> BoxFuture<Result<()>> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let result = (|| {
            if let Some(err) = self.write_denied(location) {
                return Err(err);
            }
            let mut entries = self.lock_entries();
            if !entries.contains_key(location) {
                return Err(FileError::NotFound(location.to_path_buf()));
            }
            entries.retain(|path, _| path != location && !path.starts_with(location));
            Ok(())
        })();
        ready(result)
    }

    fn move_entry(&self, from: &Path, to: &Path) -> BoxFuture<Result<()>> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);
        let result = (|| {
            if let Some(err) = self.write_denied(from) {
                return Err(err);
            }
            let mut entries = self.lock_entries();
            if !entries.contains_key(from) {
                return Err(FileError::NotFound(from.to_path_buf()));
            }
            let moved: Vec<(PathBuf, MemEntry)> = entries
                .iter()
                .filter(|(path, _)| path.as_path() == from || path.starts_with(from))
                .map(|(path, entry)| (path.clone(), *entry))
                .collect();
            for (path, entry) in moved {
                entries.remove(&path);
                let relocated = if path.as_path() == from {
                    to.to_path_buf()
                } else {
                    match path.strip_prefix(from) {
                        Ok(rel) => to.join(rel),
                        Err(_) => continue,
                    }
                };
                entries.insert(relocated, entry);
            }
            Ok(())
        })();
        ready(result)
    }

    fn exists(&self, location: &Path) -> BoxFuture<bool> {
        let entries = self.lock_entries();
        ready(entries.contains_key(location))
    }
}
