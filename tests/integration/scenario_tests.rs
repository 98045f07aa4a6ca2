use dupescan::duplicates::{DuplicateFinder, FinderConfig};
use dupescan::exclusions::default_exclusions;
use dupescan::scanner::{DigestStrategy, ScanConfig};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const THRESHOLD: u64 = 4096;

fn finder(exclusions: &[&str], strategy: DigestStrategy) -> DuplicateFinder {
    let exclusions: HashSet<String> = exclusions.iter().map(|s| s.to_string()).collect();
    DuplicateFinder::new(
        FinderConfig::default()
            .with_scan_config(
                ScanConfig::default()
                    .with_exclusions(exclusions)
                    .with_min_size(THRESHOLD),
            )
            .with_strategy(strategy),
    )
}

fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

/// Two roots `r1` and `r2` under one temp directory.
fn two_roots() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let r1 = dir.path().join("r1");
    let r2 = dir.path().join("r2");
    fs::create_dir(&r1).unwrap();
    fs::create_dir(&r2).unwrap();
    (dir, r1, r2)
}

#[test]
fn test_identical_files_in_two_roots() {
    let (_dir, r1, r2) = two_roots();
    let content = patterned(10_000, 3);
    fs::write(r1.join("same.txt"), &content).unwrap();
    fs::write(r2.join("same.txt"), &content).unwrap();

    let result = finder(&[], DigestStrategy::Sampled)
        .find_duplicates(&[r1.clone(), r2.clone()])
        .unwrap();

    assert_eq!(result.duplicates().len(), 1);
    let (digest, paths) = result.duplicates().iter().next().unwrap();
    assert_eq!(digest.size, 10_000);
    assert!(digest.hash.starts_with('s'));
    assert_eq!(paths, &[r1.join("same.txt"), r2.join("same.txt")][..]);
    assert_eq!(result.duplicate_count(), 1);
    assert_eq!(result.reclaimable_bytes(), 10_000);
}

#[test]
fn test_same_size_different_content_is_not_duplicate() {
    let dir = tempdir().unwrap();
    let r1 = dir.path().to_path_buf();
    fs::write(r1.join("a.bin"), patterned(2000, 1)).unwrap();
    fs::write(r1.join("b.bin"), patterned(2000, 2)).unwrap();

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_scan_config(ScanConfig::default().with_min_size(1)),
    );
    let result = finder.find_duplicates(&[r1]).unwrap();

    // Both are candidates, neither is a duplicate
    assert_eq!(result.total_files(), 2);
    assert_eq!(result.stats().groups_total, 1);
    assert_eq!(result.stats().files_hashed, 2);
    assert!(!result.has_duplicates());
    assert_eq!(result.duplicate_count(), 0);
    assert_eq!(result.reclaimable_bytes(), 0);
}

#[test]
fn test_excluded_directory_never_indexed() {
    let dir = tempdir().unwrap();
    let r1 = dir.path().to_path_buf();
    fs::create_dir(r1.join("node_modules")).unwrap();
    fs::write(r1.join("node_modules").join("big.bin"), patterned(50_000, 9)).unwrap();
    fs::write(r1.join("kept.bin"), patterned(5_000, 9)).unwrap();

    let result = finder(&["node_modules"], DigestStrategy::Sampled)
        .find_duplicates(&[r1.clone()])
        .unwrap();

    assert!(!result
        .files()
        .contains_key(&r1.join("node_modules").join("big.bin")));
    assert_eq!(result.total_files(), 1);
    assert_eq!(result.scanned_bytes(), 5_000);
}

#[test]
fn test_file_below_threshold_never_indexed() {
    let dir = tempdir().unwrap();
    let r1 = dir.path().to_path_buf();
    fs::write(r1.join("tiny.txt"), b"hello").unwrap();
    fs::write(r1.join("tiny-copy.txt"), b"hello").unwrap();

    let result = finder(&[], DigestStrategy::Sampled)
        .find_duplicates(&[r1])
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.stats().files_hashed, 0);
}

#[test]
fn test_threshold_boundary_is_inclusive() {
    let dir = tempdir().unwrap();
    let r1 = dir.path().to_path_buf();
    let at = patterned(THRESHOLD as usize, 4);
    let below = patterned(THRESHOLD as usize - 1, 4);
    fs::write(r1.join("at1.dat"), &at).unwrap();
    fs::write(r1.join("at2.dat"), &at).unwrap();
    fs::write(r1.join("below1.dat"), &below).unwrap();
    fs::write(r1.join("below2.dat"), &below).unwrap();

    let result = finder(&[], DigestStrategy::Sampled)
        .find_duplicates(&[r1.clone()])
        .unwrap();

    assert_eq!(result.total_files(), 2);
    assert!(result.files().contains_key(&r1.join("at1.dat")));
    assert!(!result.files().contains_key(&r1.join("below1.dat")));
    assert_eq!(result.duplicates().len(), 1);
    assert!(result.duplicates().contains_path(&r1.join("at2.dat")));
}

#[test]
fn test_excluded_name_at_any_depth() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let nested = root.join("a").join("b").join(".git").join("objects");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(nested.join("pack.bin"), patterned(8_000, 5)).unwrap();
    fs::write(root.join(".git").join("pack.bin"), patterned(8_000, 5)).unwrap();
    fs::write(root.join("a").join("visible.bin"), patterned(8_000, 5)).unwrap();

    let result = DuplicateFinder::new(
        FinderConfig::default()
            .with_scan_config(ScanConfig::default().with_exclusions(default_exclusions())),
    )
    .find_duplicates(&[root])
    .unwrap();

    assert!(result
        .files()
        .keys()
        .all(|p| !p.components().any(|c| c.as_os_str() == ".git")));
    assert_eq!(result.total_files(), 1);
    assert!(!result.has_duplicates());
}

#[test]
fn test_excluded_file_name_skips_only_that_file() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    fs::write(root.join("Thumbs.db"), patterned(6_000, 1)).unwrap();
    fs::write(root.join("copy.db"), patterned(6_000, 1)).unwrap();
    fs::write(root.join("other.db"), patterned(6_000, 1)).unwrap();

    let result = finder(&["Thumbs.db"], DigestStrategy::Sampled)
        .find_duplicates(&[root.clone()])
        .unwrap();

    assert_eq!(result.total_files(), 2);
    assert!(!result.duplicates().contains_path(&root.join("Thumbs.db")));
    assert_eq!(result.duplicate_count(), 1);
}

fn populate_mixed_tree(root: &Path) {
    for (i, sub) in ["x", "y", "z"].iter().enumerate() {
        let dir = root.join(sub);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("shared.bin"), patterned(12_000, 1)).unwrap();
        fs::write(dir.join("shared.txt"), patterned(4_500, 2)).unwrap();
        fs::write(dir.join("own.bin"), patterned(12_000, 10 + i as u8)).unwrap();
    }
}

#[test]
fn test_runs_are_idempotent() {
    let dir = tempdir().unwrap();
    populate_mixed_tree(dir.path());

    for strategy in [DigestStrategy::Sampled, DigestStrategy::Full] {
        let first = finder(&[], strategy)
            .find_duplicates(&[dir.path().to_path_buf()])
            .unwrap();
        let second = finder(&[], strategy)
            .find_duplicates(&[dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(first.duplicates(), second.duplicates());
        assert_eq!(first.aggregate(), second.aggregate());
        assert_eq!(first.duplicates().len(), 2);
        assert_eq!(first.duplicate_count(), 4);
        assert_eq!(first.reclaimable_bytes(), 2 * 12_000 + 2 * 4_500);
    }
}

#[test]
fn test_groups_share_size_and_extension() {
    let dir = tempdir().unwrap();
    populate_mixed_tree(dir.path());

    let result = finder(&[], DigestStrategy::Sampled)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    for (digest, paths) in result.duplicates() {
        assert!(paths.len() >= 2);
        for path in paths {
            let meta = &result.files()[path];
            assert_eq!(meta.size, digest.size);
            assert!(path
                .to_string_lossy()
                .ends_with(digest.extension.as_str()));
        }
    }
}
