//! Change-notification port.

use std::any::Any;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub location: PathBuf,
}

impl ChangeEvent {
    pub fn added(location: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Added,
            location: location.into(),
        }
    }

    pub fn updated(location: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Updated,
            location: location.into(),
        }
    }

    pub fn deleted(location: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Deleted,
            location: location.into(),
        }
    }
}

#[derive(Debug)]
pub struct WatchError(String);

impl WatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch error: {}", self.0)
    }
}

impl std::error::Error for WatchError {}

/// A live watch on one root. Events arrive in delivery order; dropping the
/// subscription (or calling [`WatchSubscription::dispose`]) stops the watch.
pub struct WatchSubscription {
    rx: UnboundedReceiver<ChangeEvent>,
    // Keeps the backend watcher alive for the lifetime of the subscription.
    _guard: Option<Box<dyn Any + Send>>,
}

impl WatchSubscription {
    pub fn new(rx: UnboundedReceiver<ChangeEvent>, guard: Option<Box<dyn Any + Send>>) -> Self {
        Self { rx, _guard: guard }
    }

    /// Subscription fed manually through the returned sender; used by tests
    /// and by hosts that synthesize events.
    pub fn channel() -> (UnboundedSender<ChangeEvent>, Self) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (tx, Self::new(rx, None))
    }

    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    pub fn dispose(self) {}
}

pub trait WatchProvider: Send + Sync {
    fn watch(&self, root: &Path) -> Result<WatchSubscription, WatchError>;
}
