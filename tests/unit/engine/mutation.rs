use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::{FileTreeEngine, MoveOutcome, PLACEHOLDER_NAME};
use crate::services::adapters::MemoryFileAccessor;
use crate::services::ports::file::{FileAccessor, FileError};
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

fn temporary_count(engine: &FileTreeEngine) -> usize {
    engine.rows().iter().filter(|row| row.is_temporary).count()
}

#[tokio::test]
async fn placeholder_is_single_per_parent() {
    let (engine, _accessor) = engine_with_root().await;

    let first = engine
        .create_placeholder(Path::new("/ws"), false)
        .await
        .unwrap();
    assert!(engine.contains(&first));
    assert_eq!(temporary_count(&engine), 1);

    // Creating a second placeholder replaces the first.
    let second = engine
        .create_placeholder(Path::new("/ws"), true)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(temporary_count(&engine), 1);
}

#[tokio::test]
async fn placeholder_auto_expands_collapsed_directory() {
    let (engine, _accessor) = engine_with_root().await;
    assert!(!engine.entry_flags(Path::new("/ws/dir")).unwrap().expanded);

    let placeholder = engine
        .create_placeholder(Path::new("/ws/dir"), false)
        .await
        .unwrap();

    assert!(engine.entry_flags(Path::new("/ws/dir")).unwrap().expanded);
    assert_eq!(
        engine.child_locations(Path::new("/ws/dir")),
        vec![
            PathBuf::from("/ws/dir").join(PLACEHOLDER_NAME),
            PathBuf::from("/ws/dir/x.txt"),
        ]
    );
    assert!(engine.contains(&placeholder));
}

#[tokio::test]
async fn placeholder_under_a_file_lands_in_its_parent() {
    let (engine, _accessor) = engine_with_root().await;

    let placeholder = engine
        .create_placeholder(Path::new("/ws/a.txt"), false)
        .await
        .unwrap();
    assert_eq!(placeholder, PathBuf::from("/ws").join(PLACEHOLDER_NAME));
}

#[tokio::test]
async fn confirmed_placeholder_materializes_via_watcher_only() {
    let (engine, accessor) = engine_with_root().await;

    let placeholder = engine
        .create_placeholder(Path::new("/ws"), false)
        .await
        .unwrap();
    engine
        .confirm_placeholder(&placeholder, "new.txt")
        .await
        .unwrap();

    // The placeholder is gone and the creation reached the accessor, but the
    // node itself is not mirrored yet.
    assert!(!engine.contains(&placeholder));
    assert!(accessor.exists(Path::new("/ws/new.txt")).await);
    assert!(!engine.contains(Path::new("/ws/new.txt")));

    // The Added notification inserts exactly one entry.
    assert!(engine.apply_change(ChangeEvent::added("/ws/new.txt")).await);
    assert!(engine.contains(Path::new("/ws/new.txt")));
    assert_eq!(temporary_count(&engine), 0);
    assert_eq!(
        engine.child_locations(Path::new("/ws")),
        vec![
            PathBuf::from("/ws/a.txt"),
            PathBuf::from("/ws/dir"),
            PathBuf::from("/ws/new.txt"),
        ]
    );
}

#[tokio::test]
async fn confirm_with_existing_target_skips_creation() {
    let (engine, accessor) = engine_with_root().await;
    let placeholder = engine
        .create_placeholder(Path::new("/ws"), false)
        .await
        .unwrap();
    let baseline = accessor.create_calls();

    engine
        .confirm_placeholder(&placeholder, "a.txt")
        .await
        .unwrap();

    assert_eq!(accessor.create_calls(), baseline);
    assert!(!engine.contains(&placeholder));
}

#[tokio::test]
async fn confirm_with_empty_name_cancels() {
    let (engine, accessor) = engine_with_root().await;
    let placeholder = engine
        .create_placeholder(Path::new("/ws"), false)
        .await
        .unwrap();
    let baseline = accessor.create_calls();

    engine.confirm_placeholder(&placeholder, "").await.unwrap();

    assert_eq!(accessor.create_calls(), baseline);
    assert!(!engine.contains(&placeholder));
}

#[tokio::test]
async fn failed_confirmation_does_not_resurrect_placeholder() {
    let (engine, accessor) = engine_with_root().await;
    let placeholder = engine
        .create_placeholder(Path::new("/ws"), false)
        .await
        .unwrap();

    accessor.set_deny_writes(true);
    let result = engine.confirm_placeholder(&placeholder, "z.txt").await;

    assert!(matches!(result, Err(FileError::PermissionDenied(_))));
    assert!(!engine.contains(&placeholder));
    assert_eq!(temporary_count(&engine), 0);
}

#[tokio::test]
async fn declined_overwrite_makes_no_accessor_call() {
    let (engine, accessor) = engine_with_root().await;
    accessor.add_dir("/ws/sub");
    accessor.add_file("/ws/sub/a.txt");
    engine.apply_change(ChangeEvent::added("/ws/sub")).await;
    engine.toggle_expand(Path::new("/ws/sub")).await.unwrap();

    let outcome = engine
        .move_entry(Path::new("/ws/a.txt"), Path::new("/ws/sub"), false)
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::Declined);
    assert_eq!(accessor.move_calls(), 0);
    assert!(engine.contains(Path::new("/ws/a.txt")));
    assert!(engine.contains(Path::new("/ws/sub/a.txt")));
}

#[tokio::test]
async fn confirmed_overwrite_moves_and_focuses_destination() {
    let (engine, accessor) = engine_with_root().await;
    accessor.add_dir("/ws/sub");
    accessor.add_file("/ws/sub/a.txt");
    engine.apply_change(ChangeEvent::added("/ws/sub")).await;
    engine.toggle_expand(Path::new("/ws/sub")).await.unwrap();

    let outcome = engine
        .move_entry(Path::new("/ws/a.txt"), Path::new("/ws/sub"), true)
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::Moved);
    assert_eq!(accessor.move_calls(), 1);
    assert!(engine.entry_flags(Path::new("/ws/sub/a.txt")).unwrap().focused);
}

#[tokio::test]
async fn move_to_same_directory_only_refocuses() {
    let (engine, accessor) = engine_with_root().await;

    let outcome = engine
        .move_entry(Path::new("/ws/a.txt"), Path::new("/ws"), false)
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::SamePath);
    assert_eq!(accessor.move_calls(), 0);
    assert!(engine.entry_flags(Path::new("/ws/a.txt")).unwrap().focused);
}

#[tokio::test]
async fn delete_is_delegated_and_applied_by_notification() {
    let (engine, accessor) = engine_with_root().await;

    engine.delete_entry(Path::new("/ws/a.txt")).await.unwrap();

    // Never removed speculatively.
    assert!(engine.contains(Path::new("/ws/a.txt")));
    assert!(!accessor.exists(Path::new("/ws/a.txt")).await);

    engine.apply_change(ChangeEvent::deleted("/ws/a.txt")).await;
    assert!(!engine.contains(Path::new("/ws/a.txt")));
}

#[tokio::test]
async fn delete_entries_stops_at_first_failure() {
    let (engine, accessor) = engine_with_root().await;

    let result = engine
        .delete_entries(&[
            PathBuf::from("/ws/a.txt"),
            PathBuf::from("/ws/missing.txt"),
            PathBuf::from("/ws/dir"),
        ])
        .await;

    assert!(matches!(result, Err(FileError::NotFound(_))));
    assert!(!accessor.exists(Path::new("/ws/a.txt")).await);
    assert!(accessor.exists(Path::new("/ws/dir")).await);
}

#[tokio::test]
async fn rename_flow_marks_and_delegates() {
    let (engine, accessor) = engine_with_root().await;

    assert!(engine.begin_rename(Path::new("/ws/a.txt")));
    let marked = engine
        .rows()
        .iter()
        .any(|row| row.location == Path::new("/ws/a.txt") && row.is_temporary);
    assert!(marked);

    engine
        .commit_rename(Path::new("/ws/a.txt"), "b.txt")
        .await
        .unwrap();

    assert_eq!(accessor.move_calls(), 1);
    assert!(accessor.exists(Path::new("/ws/b.txt")).await);
    let still_marked = engine
        .rows()
        .iter()
        .any(|row| row.location == Path::new("/ws/a.txt") && row.is_temporary);
    assert!(!still_marked);
}

#[tokio::test]
async fn commit_rename_with_unchanged_name_skips_accessor() {
    let (engine, accessor) = engine_with_root().await;
    engine.begin_rename(Path::new("/ws/a.txt"));

    engine
        .commit_rename(Path::new("/ws/a.txt"), "a.txt")
        .await
        .unwrap();

    assert_eq!(accessor.move_calls(), 0);
}

#[tokio::test]
async fn create_entry_leaves_existing_files_alone() {
    let (engine, accessor) = engine_with_root().await;
    let baseline = accessor.create_calls();

    engine
        .create_entry(Path::new("/ws/a.txt"), false)
        .await
        .unwrap();
    assert_eq!(accessor.create_calls(), baseline);

    engine
        .create_entry(Path::new("/ws/fresh.txt"), false)
        .await
        .unwrap();
    assert_eq!(accessor.create_calls(), baseline + 1);
    assert!(accessor.exists(Path::new("/ws/fresh.txt")).await);
}
