use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::FileTreeEngine;
use crate::services::adapters::MemoryFileAccessor;
use crate::services::ports::workspace::WorkspaceRoot;

async fn engine_with_root() -> FileTreeEngine {
    let accessor = Arc::new(MemoryFileAccessor::new());
    accessor.add_dir("/ws");
    accessor.add_file("/ws/a.txt");
    accessor.add_dir("/ws/dir");
    accessor.add_file("/ws/dir/x.txt");

    let engine = FileTreeEngine::new(accessor, EngineConfig::default());
    engine
        .load_roots(&[WorkspaceRoot::directory("/ws")])
        .await
        .expect("load roots");
    engine
}

#[tokio::test]
async fn selecting_clears_previous_selection() {
    let engine = engine_with_root().await;

    assert!(engine.set_selected(&[PathBuf::from("/ws/a.txt")], true));
    let flags = engine.entry_flags(Path::new("/ws/a.txt")).unwrap();
    assert!(flags.selected);
    assert!(flags.focused);

    assert!(engine.set_selected(&[PathBuf::from("/ws/dir")], true));
    let previous = engine.entry_flags(Path::new("/ws/a.txt")).unwrap();
    assert!(!previous.selected);
    assert!(!previous.focused);
    assert!(engine.entry_flags(Path::new("/ws/dir")).unwrap().selected);
}

#[tokio::test]
async fn empty_selection_clears_focus_only() {
    let engine = engine_with_root().await;
    engine.set_selected(&[PathBuf::from("/ws/a.txt")], true);

    assert!(engine.set_selected(&[], true));

    let flags = engine.entry_flags(Path::new("/ws/a.txt")).unwrap();
    assert!(flags.selected);
    assert!(!flags.focused);
    assert!(engine.is_selected());
    assert!(!engine.is_focused());
}

#[tokio::test]
async fn focus_is_independent_of_selection() {
    let engine = engine_with_root().await;
    engine.set_selected(&[PathBuf::from("/ws/a.txt")], true);

    assert!(engine.set_focused(&[PathBuf::from("/ws/dir")], true));

    let selected = engine.entry_flags(Path::new("/ws/a.txt")).unwrap();
    assert!(selected.selected);
    assert!(!selected.focused);
    let focused = engine.entry_flags(Path::new("/ws/dir")).unwrap();
    assert!(focused.focused);
    assert!(!focused.selected);
    assert_eq!(engine.focused_paths(), vec![PathBuf::from("/ws/dir")]);
}

#[tokio::test]
async fn selected_keys_reports_current_selection() {
    let engine = engine_with_root().await;
    engine.set_selected(&[PathBuf::from("/ws/a.txt")], true);

    let keys = engine.selected_keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].as_str(), "/ws/a.txt");
}

#[tokio::test]
async fn selecting_unknown_paths_changes_nothing() {
    let engine = engine_with_root().await;
    engine.set_selected(&[PathBuf::from("/ws/ghost")], true);
    assert!(!engine.is_selected());
}

#[tokio::test]
async fn rows_flatten_expanded_directories_only() {
    let engine = engine_with_root().await;

    let rows = engine.rows();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["ws", "a.txt", "dir"]);
    assert_eq!(rows[0].depth, 0);
    assert_eq!(rows[1].depth, 1);

    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();
    let names: Vec<String> = engine
        .rows()
        .iter()
        .map(|r| r.name.to_string())
        .collect();
    assert_eq!(names, vec!["ws", "a.txt", "dir", "x.txt"]);
}
