use dupescan::diagnostics::MemoryDiagnostics;
use dupescan::duplicates::{
    build_shortlist, DuplicateFinder, DuplicateIndex, FinderConfig, FinderError, HashScheduler,
};
use dupescan::scanner::{DigestStrategy, FileMetadata, PathIndex, RootFailurePolicy, ScanError};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_missing_root_is_skipped_by_default() {
    let good = tempdir().unwrap();
    fs::write(good.path().join("a.txt"), b"dup").unwrap();
    fs::write(good.path().join("b.txt"), b"dup").unwrap();
    let missing = good.path().join("gone");

    let sink = Arc::new(MemoryDiagnostics::new());
    let finder = DuplicateFinder::new(FinderConfig::default().with_diagnostics(sink.clone()));
    let result = finder
        .find_duplicates(&[missing.clone(), good.path().to_path_buf()])
        .unwrap();

    assert_eq!(result.duplicates().len(), 1);
    assert_eq!(result.root_errors().len(), 1);
    assert!(matches!(
        &result.root_errors()[0],
        ScanError::RootNotFound(path) if path == &missing
    ));
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.errors()[0].starts_with("error while scanning directory "));
}

#[test]
fn test_abort_policy_stops_at_first_bad_root() {
    let good = tempdir().unwrap();
    fs::write(good.path().join("a.txt"), b"dup").unwrap();
    fs::write(good.path().join("b.txt"), b"dup").unwrap();
    let not_dir = good.path().join("a.txt");

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_root_failure(RootFailurePolicy::Abort),
    );
    let err = finder
        .find_duplicates(&[good.path().to_path_buf(), not_dir.clone()])
        .unwrap_err();

    match err {
        FinderError::Scan {
            source: ScanError::NotADirectory(path),
        } => assert_eq!(path, not_dir),
        other => panic!("Expected NotADirectory, got: {other:?}"),
    }
}

#[test]
fn test_every_root_failing_is_an_error() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let err = finder
        .find_duplicates(&[dir.path().join("x"), dir.path().join("y")])
        .unwrap_err();

    assert!(matches!(err, FinderError::AllRootsFailed { count: 2 }));
    assert_eq!(err.to_string(), "all 2 input directories failed to scan");
}

#[test]
fn test_digest_failure_skips_file_and_continues() {
    let dir = tempdir().unwrap();
    let kept1 = dir.path().join("kept1.bin");
    let kept2 = dir.path().join("kept2.bin");
    fs::write(&kept1, b"payload!").unwrap();
    fs::write(&kept2, b"payload!").unwrap();
    let vanished = dir.path().join("vanished.bin");

    // Index a file that no longer exists by the time it is hashed
    let files: PathIndex = [
        (kept1.clone(), FileMetadata::new(8, 0)),
        (kept2.clone(), FileMetadata::new(8, 0)),
        (vanished.clone(), FileMetadata::new(8, 0)),
    ]
    .into_iter()
    .collect();

    let sink = Arc::new(MemoryDiagnostics::new());
    let shortlist = build_shortlist(&files);
    let index = DuplicateIndex::new();
    let stats = HashScheduler::new(DigestStrategy::Sampled, 2)
        .with_diagnostics(sink.clone())
        .run(&shortlist, &index)
        .unwrap();

    assert_eq!(stats.files_hashed, 2);
    assert_eq!(stats.files_failed, 1);
    assert_eq!(stats.groups_done, 1);
    assert!(!stats.interrupted);

    let groups = index.filter_to_duplicates_only();
    assert_eq!(groups.len(), 1);
    assert!(groups.contains_path(&kept1));
    assert!(!groups.contains_path(&vanished));

    let errors = sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains(&vanished.display().to_string()));
}

#[test]
fn test_unreadable_subdirectory_is_reported_not_fatal() {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), b"secret").unwrap();
        fs::write(dir.path().join("a.txt"), b"open").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; nothing to test there
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let sink = Arc::new(MemoryDiagnostics::new());
        let finder = DuplicateFinder::new(FinderConfig::default().with_diagnostics(sink.clone()));
        let result = finder.find_duplicates(&[dir.path().to_path_buf()]);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let result = result.unwrap();
        assert_eq!(result.total_files(), 1);
        assert!(result.root_errors().is_empty());
        assert!(sink.errors().iter().any(|e| e.starts_with("skipping ")));
    }
}

#[test]
fn test_interrupted_before_start() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();

    let flag = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));

    let err = finder
        .find_duplicates(&[PathBuf::from(dir.path())])
        .unwrap_err();
    assert!(matches!(err, FinderError::Interrupted));
}
