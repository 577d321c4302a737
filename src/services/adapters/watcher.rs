//! notify-backed watch provider.
//!
//! Normalizes raw notify events into the three kinds the engine consumes.
//! Renames degrade to a Deleted/Added pair so the engine keeps a single
//! insertion code path.

use std::path::{Component, Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::services::ports::watch::{
    ChangeEvent, WatchError, WatchProvider, WatchSubscription,
};

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::new(e.to_string())
    }
}

pub struct NotifyWatchProvider {
    config: EngineConfig,
}

impl NotifyWatchProvider {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl WatchProvider for NotifyWatchProvider {
    fn watch(&self, root: &Path) -> Result<WatchSubscription, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let root = root.to_path_buf();
        let config = self.config.clone();

        let closure_root = root.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                for change in normalize_notify_event(event) {
                    if contains_ignored_component(&change.location, &closure_root, &config) {
                        continue;
                    }
                    let _ = tx.send(change);
                }
            },
            Config::default().with_poll_interval(self.config.poll_interval()),
        )?;
        watcher.watch(root.as_path(), RecursiveMode::Recursive)?;

        Ok(WatchSubscription::new(rx, Some(Box::new(watcher))))
    }
}

fn contains_ignored_component(path: &Path, root: &Path, config: &EngineConfig) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| {
        if let Component::Normal(name) = component {
            config.is_ignored(&name.to_string_lossy())
        } else {
            false
        }
    })
}

fn normalize_notify_event(event: notify::Event) -> Vec<ChangeEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.into_iter().map(ChangeEvent::added).collect(),
        EventKind::Remove(_) => event.paths.into_iter().map(ChangeEvent::deleted).collect(),
        EventKind::Modify(kind) => normalize_modify_event(kind, event.paths),
        _ => Vec::new(),
    }
}

fn normalize_modify_event(kind: ModifyKind, paths: Vec<PathBuf>) -> Vec<ChangeEvent> {
    match kind {
        ModifyKind::Name(RenameMode::Both) => {
            if paths.len() >= 2 {
                let mut iter = paths.into_iter();
                let from = iter.next();
                let to = iter.next();
                match (from, to) {
                    (Some(from), Some(to)) => {
                        vec![ChangeEvent::deleted(from), ChangeEvent::added(to)]
                    }
                    _ => Vec::new(),
                }
            } else {
                paths.into_iter().map(ChangeEvent::updated).collect()
            }
        }
        ModifyKind::Name(RenameMode::From) => {
            paths.into_iter().map(ChangeEvent::deleted).collect()
        }
        ModifyKind::Name(RenameMode::To) => paths.into_iter().map(ChangeEvent::added).collect(),
        _ => paths.into_iter().map(ChangeEvent::updated).collect(),
    }
}
