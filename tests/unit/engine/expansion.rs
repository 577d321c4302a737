use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::FileTreeEngine;
use crate::services::adapters::MemoryFileAccessor;
use crate::services::ports::watch::ChangeEvent;
use crate::services::ports::workspace::WorkspaceRoot;

async fn engine_with_root() -> (FileTreeEngine, Arc<MemoryFileAccessor>) {
    let accessor = Arc::new(MemoryFileAccessor::new());
    accessor.add_dir("/ws");
    accessor.add_file("/ws/a.txt");
    accessor.add_dir("/ws/dir");
    accessor.add_file("/ws/dir/x.txt");

    let engine = FileTreeEngine::new(accessor.clone(), EngineConfig::default());
    engine
        .load_roots(&[WorkspaceRoot::directory("/ws")])
        .await
        .expect("load roots");
    (engine, accessor)
}

#[tokio::test]
async fn first_expansion_materializes_children() {
    let (engine, accessor) = engine_with_root().await;
    let baseline = accessor.list_calls();

    assert!(engine.toggle_expand(Path::new("/ws/dir")).await.unwrap());

    assert!(engine.entry_flags(Path::new("/ws/dir")).unwrap().expanded);
    assert_eq!(
        engine.child_locations(Path::new("/ws/dir")),
        vec![PathBuf::from("/ws/dir/x.txt")]
    );
    assert!(engine.contains(Path::new("/ws/dir/x.txt")));
    assert_eq!(accessor.list_calls(), baseline + 1);
}

#[tokio::test]
async fn expanding_a_file_is_a_noop() {
    let (engine, _accessor) = engine_with_root().await;
    assert!(!engine.toggle_expand(Path::new("/ws/a.txt")).await.unwrap());
    assert!(!engine.toggle_expand(Path::new("/ws/unknown")).await.unwrap());
}

#[tokio::test]
async fn collapse_keeps_children_cached() {
    let (engine, accessor) = engine_with_root().await;
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();
    let baseline = accessor.list_calls();

    // Collapse.
    assert!(engine.toggle_expand(Path::new("/ws/dir")).await.unwrap());
    assert!(!engine.entry_flags(Path::new("/ws/dir")).unwrap().expanded);
    assert!(engine.contains(Path::new("/ws/dir/x.txt")));

    // Instant re-expand from cache, no fetch.
    assert!(engine.toggle_expand(Path::new("/ws/dir")).await.unwrap());
    assert_eq!(accessor.list_calls(), baseline);
    assert_eq!(
        engine.child_locations(Path::new("/ws/dir")),
        vec![PathBuf::from("/ws/dir/x.txt")]
    );
}

#[tokio::test]
async fn stale_expansion_replaces_child_list_wholesale() {
    let (engine, accessor) = engine_with_root().await;
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();

    // The directory changes externally while collapsed; the Added event can
    // only flag it.
    accessor.remove_path(Path::new("/ws/dir/x.txt"));
    accessor.add_file("/ws/dir/y.txt");
    engine
        .apply_change(ChangeEvent::added("/ws/dir/y.txt"))
        .await;
    assert!(engine.entry_flags(Path::new("/ws/dir")).unwrap().needs_refresh);

    let entries = engine.entry_count();
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();

    assert_eq!(
        engine.child_locations(Path::new("/ws/dir")),
        vec![PathBuf::from("/ws/dir/y.txt")]
    );
    assert!(!engine.contains(Path::new("/ws/dir/x.txt")));
    assert!(!engine.entry_flags(Path::new("/ws/dir")).unwrap().needs_refresh);
    // x.txt left, y.txt arrived: no orphaned entries either way.
    assert_eq!(engine.entry_count(), entries);
}

#[tokio::test]
async fn failed_fetch_keeps_cache_and_collapsed_state() {
    let (engine, accessor) = engine_with_root().await;
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();
    engine
        .apply_change(ChangeEvent::deleted("/ws/dir/x.txt"))
        .await;
    assert!(engine.entry_flags(Path::new("/ws/dir")).unwrap().needs_refresh);

    // The directory itself vanishes; the refetch fails.
    accessor.remove_path(Path::new("/ws/dir"));
    assert!(engine.toggle_expand(Path::new("/ws/dir")).await.is_err());

    let flags = engine.entry_flags(Path::new("/ws/dir")).unwrap();
    assert!(!flags.expanded);
    assert!(flags.needs_refresh);
    assert_eq!(
        engine.child_locations(Path::new("/ws/dir")),
        vec![PathBuf::from("/ws/dir/x.txt")]
    );
}

#[tokio::test]
async fn collapse_all_without_root_collapses_every_directory() {
    let (engine, _accessor) = engine_with_root().await;
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();

    assert!(engine.collapse_all(None));

    assert!(!engine.entry_flags(Path::new("/ws")).unwrap().expanded);
    assert!(!engine.entry_flags(Path::new("/ws/dir")).unwrap().expanded);
}

#[tokio::test]
async fn collapse_all_with_root_targets_direct_directory_children() {
    let (engine, _accessor) = engine_with_root().await;
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();

    assert!(engine.collapse_all(Some(Path::new("/ws"))));

    // The root itself stays expanded; its directory children collapse and
    // are flagged stale.
    assert!(engine.entry_flags(Path::new("/ws")).unwrap().expanded);
    let flags = engine.entry_flags(Path::new("/ws/dir")).unwrap();
    assert!(!flags.expanded);
    assert!(flags.needs_refresh);
}

#[tokio::test]
async fn refresh_all_refetches_expanded_directories_immediately() {
    let (engine, accessor) = engine_with_root().await;
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();

    // External changes with no notifications delivered.
    accessor.add_file("/ws/b.txt");
    accessor.add_file("/ws/dir/y.txt");

    assert!(engine.refresh_all(Path::new("/ws")).await.unwrap());

    assert!(engine.contains(Path::new("/ws/b.txt")));
    assert!(engine.contains(Path::new("/ws/dir/y.txt")));
    assert!(!engine.entry_flags(Path::new("/ws")).unwrap().needs_refresh);
    assert!(!engine.entry_flags(Path::new("/ws/dir")).unwrap().needs_refresh);
}

#[tokio::test]
async fn refresh_all_leaves_collapsed_directories_lazy() {
    let (engine, accessor) = engine_with_root().await;
    accessor.add_file("/ws/dir/y.txt");
    let baseline = accessor.list_calls();

    engine.refresh_all(Path::new("/ws")).await.unwrap();

    // Only the expanded root was refetched; the collapsed child keeps the
    // flag for its next expansion.
    assert_eq!(accessor.list_calls(), baseline + 1);
    assert!(engine.entry_flags(Path::new("/ws/dir")).unwrap().needs_refresh);
    assert!(engine.child_locations(Path::new("/ws/dir")).is_empty());

    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();
    assert!(engine.contains(Path::new("/ws/dir/y.txt")));
}

#[tokio::test]
async fn refresh_preserves_interaction_state_of_survivors() {
    let (engine, accessor) = engine_with_root().await;
    engine.toggle_expand(Path::new("/ws/dir")).await.unwrap();
    engine.set_selected(&[PathBuf::from("/ws/a.txt")], true);

    accessor.add_file("/ws/b.txt");
    engine.refresh_all(Path::new("/ws")).await.unwrap();

    let flags = engine.entry_flags(Path::new("/ws/a.txt")).unwrap();
    assert!(flags.selected);
    assert!(engine.entry_flags(Path::new("/ws/dir")).unwrap().expanded);
    assert_eq!(
        engine.child_locations(Path::new("/ws/dir")),
        vec![PathBuf::from("/ws/dir/x.txt")]
    );
}
