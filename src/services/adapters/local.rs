//! Local file-system accessor backed by tokio::fs.

use std::io;
use std::path::{Path, PathBuf};

use crate::services::ports::file::{BoxFuture, FileAccessor, FileError, Result, Stat};

pub struct LocalFileAccessor;

impl LocalFileAccessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFileAccessor {
    fn default() -> Self {
        Self::new()
    }
}

fn map_io_error(e: io::Error, location: &Path) -> FileError {
    match e.kind() {
        io::ErrorKind::NotFound => FileError::NotFound(location.to_path_buf()),
        io::ErrorKind::PermissionDenied => FileError::PermissionDenied(location.to_path_buf()),
        io::ErrorKind::AlreadyExists => FileError::AlreadyExists(location.to_path_buf()),
        _ => FileError::Io(e),
    }
}

async fn stat_location(location: PathBuf) -> Result<Stat> {
    let symlink_meta = tokio::fs::symlink_metadata(&location)
        .await
        .map_err(|e| map_io_error(e, &location))?;
    let is_symbolic_link = symlink_meta.file_type().is_symlink();

    // Follow the link for kind/size; a broken link keeps the link metadata.
    let meta = if is_symbolic_link {
        tokio::fs::metadata(&location).await.unwrap_or(symlink_meta)
    } else {
        symlink_meta
    };

    Ok(Stat {
        location,
        is_directory: meta.is_dir(),
        is_symbolic_link,
        size: meta.len(),
        modified: meta.modified().ok(),
    })
}

impl FileAccessor for LocalFileAccessor {
    fn stat(&self, location: &Path) -> BoxFuture<Result<Stat>> {
        let location = location.to_path_buf();
        Box::pin(stat_location(location))
    }

    fn list_children(&self, dir: &Stat) -> BoxFuture<Result<Vec<Stat>>> {
        let dir_location = dir.location.clone();
        let is_directory = dir.is_directory;
        Box::pin(async move {
            if !is_directory {
                return Err(FileError::NotADirectory(dir_location));
            }

            let mut read_dir = tokio::fs::read_dir(&dir_location)
                .await
                .map_err(|e| map_io_error(e, &dir_location))?;

            let mut children = Vec::new();
            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| map_io_error(e, &dir_location))?
            {
                match stat_location(entry.path()).await {
                    Ok(stat) => children.push(stat),
                    // Entry vanished between listing and stat.
                    Err(FileError::NotFound(_)) => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(children)
        })
    }

    fn create(&self, location: &Path, is_directory: bool) -> BoxFuture<Result<()>> {
        let location = location.to_path_buf();
        Box::pin(async move {
            if is_directory {
                tokio::fs::create_dir(&location)
                    .await
                    .map_err(|e| map_io_error(e, &location))
            } else {
                tokio::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&location)
                    .await
                    .map(|_| ())
                    .map_err(|e| map_io_error(e, &location))
            }
        })
    }

    fn delete(&self, location: &Path) -> BoxFuture<Result<()>> {
        let location = location.to_path_buf();
        Box::pin(async move {
            let meta = tokio::fs::symlink_metadata(&location)
                .await
                .map_err(|e| map_io_error(e, &location))?;
            if meta.is_dir() {
                tokio::fs::remove_dir_all(&location)
                    .await
                    .map_err(|e| map_io_error(e, &location))
            } else {
                tokio::fs::remove_file(&location)
                    .await
                    .map_err(|e| map_io_error(e, &location))
            }
        })
    }

    fn move_entry(&self, from: &Path, to: &Path) -> BoxFuture<Result<()>> {
        let from = from.to_path_buf();
        let to = to.to_path_buf();
        Box::pin(async move {
            tokio::fs::rename(&from, &to)
                .await
                .map_err(|e| map_io_error(e, &from))
        })
    }

    fn exists(&self, location: &Path) -> BoxFuture<bool> {
        let location = location.to_path_buf();
        Box::pin(async move { tokio::fs::try_exists(&location).await.unwrap_or(false) })
    }
}
