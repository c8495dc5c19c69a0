use dispatch_engine::{ensure_cache_dir, CacheError, SnapshotStore};

#[test]
fn transcript_snapshot_is_written_atomically_and_replaced() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path().to_path_buf());

    store.save_transcript("first").expect("write ok");
    assert_eq!(store.load_transcript().unwrap().as_deref(), Some("first"));

    store.save_transcript("second").expect("rewrite ok");
    assert_eq!(store.load_transcript().unwrap().as_deref(), Some("second"));
}

#[test]
fn missing_snapshots_load_as_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path().to_path_buf());

    assert_eq!(store.load_transcript().unwrap(), None);
    assert_eq!(store.load_draft().unwrap(), None);
}

#[test]
fn draft_snapshot_round_trips_and_clears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path().to_path_buf());

    store.save_draft("half a thought").expect("write ok");
    assert_eq!(
        store.load_draft().unwrap().as_deref(),
        Some("half a thought")
    );

    store.clear_draft().expect("clear ok");
    assert_eq!(store.load_draft().unwrap(), None);
    // Clearing twice is a no-op.
    store.clear_draft().expect("second clear ok");
}

#[test]
fn ensure_cache_dir_creates_missing_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("state").join("cache");

    ensure_cache_dir(&nested).expect("created");
    assert!(nested.is_dir());
}

#[test]
fn ensure_cache_dir_rejects_a_file_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, "x").unwrap();

    let err = ensure_cache_dir(&file).unwrap_err();
    assert!(matches!(err, CacheError::CacheDir(_)));
}
