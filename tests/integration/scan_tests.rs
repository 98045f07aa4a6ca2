use dupescan::duplicates::{DuplicateFinder, FinderConfig};
use dupescan::scanner::{DigestStrategy, ScanConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write_file(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(result.is_empty());
    assert!(!result.has_duplicates());
    assert_eq!(result.total_files(), 0);
    assert_eq!(result.scanned_bytes(), 0);
    assert_eq!(result.duplicate_count(), 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("a.txt"), b"content a");
    write_file(&dir.path().join("b.txt"), b"content b");
    write_file(&dir.path().join("c.txt"), b"content c");

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(!result.is_empty());
    assert!(!result.has_duplicates());
    assert_eq!(result.total_files(), 3);
    assert_eq!(result.scanned_bytes(), 27);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("a.txt"), b"duplicate");
    write_file(&dir.path().join("b.txt"), b"duplicate");
    write_file(&dir.path().join("c.txt"), b"unique!!!");

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(result.duplicates().len(), 1);
    let (digest, paths) = result.duplicates().iter().next().unwrap();
    assert_eq!(digest.extension, ".txt");
    assert_eq!(digest.size, 9);
    assert_eq!(
        paths,
        &[dir.path().join("a.txt"), dir.path().join("b.txt")][..]
    );
    assert_eq!(result.total_files(), 3);
    assert_eq!(result.duplicate_count(), 1);
    assert_eq!(result.reclaimable_bytes(), 9);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir");
    fs::create_dir(&sub).unwrap();

    write_file(&dir.path().join("a.txt"), b"dup");
    write_file(&sub.join("b.txt"), b"dup");

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(result.duplicates().len(), 1);
    assert!(result.duplicates().contains_path(&sub.join("b.txt")));
    assert_eq!(result.total_files(), 2);
}

#[test]
fn test_scan_multiple_groups() {
    let dir = tempdir().unwrap();

    for name in ["1a.txt", "1b.txt", "1c.txt"] {
        write_file(&dir.path().join(name), b"group1");
    }
    for name in ["2a.txt", "2b.txt"] {
        write_file(&dir.path().join(name), b"group-two");
    }
    write_file(&dir.path().join("unique.txt"), b"no twin here");

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    let aggregate = result.aggregate();
    assert_eq!(aggregate.group_count, 2);
    assert_eq!(aggregate.duplicate_count, 3);
    assert_eq!(aggregate.reclaimable_bytes, 2 * 6 + 9);

    // Larger files come first
    let sizes: Vec<u64> = result.duplicates().iter().map(|(d, _)| d.size).collect();
    assert_eq!(sizes, vec![9, 6]);
}

#[test]
fn test_same_content_different_extension_not_grouped() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("photo.jpg"), b"identical bytes");
    write_file(&dir.path().join("photo.png"), b"identical bytes");

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(result.total_files(), 2);
    assert!(!result.has_duplicates());
}

#[test]
fn test_extension_case_is_ignored() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("IMG_1.JPG"), b"camera roll");
    write_file(&dir.path().join("img_1.jpg"), b"camera roll");

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(result.duplicates().len(), 1);
    assert_eq!(result.duplicates().iter().next().unwrap().0.extension, ".jpg");
}

#[test]
fn test_mac_artifacts_are_skipped() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("._a.txt"), b"resource fork");
    write_file(&dir.path().join("._b.txt"), b"resource fork");

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(result.is_empty());
}

#[test]
fn test_thorough_mode_finds_same_groups() {
    let dir = tempdir().unwrap();

    let big = vec![7u8; 20_000];
    write_file(&dir.path().join("a.bin"), &big);
    write_file(&dir.path().join("b.bin"), &big);
    write_file(&dir.path().join("c.txt"), b"small dup");
    write_file(&dir.path().join("d.txt"), b"small dup");

    let sampled = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();
    let thorough = DuplicateFinder::new(FinderConfig::default().with_strategy(DigestStrategy::Full))
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(sampled.aggregate(), thorough.aggregate());
    for (digest, _) in thorough.duplicates() {
        // 64 hex digits of SHA-256
        assert_eq!(digest.hash.len(), 64);
    }
}

#[test]
fn test_sampled_mode_misses_middle_difference() {
    let dir = tempdir().unwrap();

    // Same sampled windows, different bytes between them
    let a = vec![0u8; 100_000];
    let mut b = a.clone();
    b[20_000] = 1;
    write_file(&dir.path().join("a.bin"), &a);
    write_file(&dir.path().join("b.bin"), &b);

    let sampled = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(sampled.duplicates().len(), 1);

    let thorough = DuplicateFinder::new(FinderConfig::default().with_strategy(DigestStrategy::Full))
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();
    assert!(!thorough.has_duplicates());
}

#[test]
fn test_min_size_filters_small_files() {
    let dir = tempdir().unwrap();

    write_file(&dir.path().join("small1.txt"), b"tiny");
    write_file(&dir.path().join("small2.txt"), b"tiny");
    write_file(&dir.path().join("large1.txt"), &[b'x'; 100]);
    write_file(&dir.path().join("large2.txt"), &[b'x'; 100]);

    let config = FinderConfig::default().with_scan_config(ScanConfig::default().with_min_size(10));
    let finder = DuplicateFinder::new(config);
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(result.total_files(), 2);
    assert_eq!(result.duplicates().len(), 1);
    assert_eq!(result.duplicates().iter().next().unwrap().0.size, 100);
}

#[test]
fn test_run_result_keeps_modification_times() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dated.txt");
    write_file(&path, b"dated");
    filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(1_500_000_000, 0))
        .unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(result.files().get(&path).unwrap().modified, 1_500_000_000);
}
