use dupescan::duplicates::DuplicateFinder;
use dupescan::output::TextOutput;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_paths_with_quotes() {
    let dir = tempdir().unwrap();

    // Windows does not allow double quotes in filenames.
    if cfg!(not(windows)) {
        let quote_path = dir.path().join("file_with_\"quote\".txt");
        File::create(&quote_path)
            .expect("Failed to create file with quotes")
            .write_all(b"content")
            .unwrap();
        File::create(dir.path().join("duplicate.txt"))
            .unwrap()
            .write_all(b"content")
            .unwrap();

        let finder = DuplicateFinder::with_defaults();
        let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(result.duplicates().len(), 1);
        assert!(result.duplicates().contains_path(&quote_path));
    }
}

#[test]
fn test_paths_with_spaces_and_unicode() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("Fotos del año");
    fs::create_dir(&nested).unwrap();

    let a = nested.join("playa día 1.jpg");
    let b = dir.path().join("写真.jpg");
    fs::write(&a, b"beach").unwrap();
    fs::write(&b, b"beach").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(result.duplicates().len(), 1);
    let report = TextOutput::new(result.duplicates()).render();
    assert!(report.contains("playa día 1.jpg"));
    assert!(report.contains("写真.jpg"));
}

#[test]
fn test_hidden_files_are_scanned() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".env.local"), b"KEY=1").unwrap();
    fs::write(dir.path().join(".env.backup"), b"KEY=1").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    // Different extensions (".local" vs ".backup"), so never compared
    assert_eq!(result.total_files(), 2);
    assert!(!result.has_duplicates());
}

#[test]
fn test_dotfiles_with_different_names_are_not_grouped() {
    let dir = tempdir().unwrap();
    let content = vec![b'#'; 5000];
    fs::write(dir.path().join(".bashrc"), &content).unwrap();
    fs::write(dir.path().join(".zshrc"), &content).unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(result.total_files(), 2);
    assert!(!result.has_duplicates());
    assert_eq!(result.duplicate_count(), 0);
}

#[test]
fn test_same_dotfile_in_two_directories_is_grouped() {
    let dir = tempdir().unwrap();
    let home = dir.path().join("home");
    let backup = dir.path().join("backup");
    fs::create_dir(&home).unwrap();
    fs::create_dir(&backup).unwrap();
    let content = vec![b'#'; 5000];
    fs::write(home.join(".bashrc"), &content).unwrap();
    fs::write(backup.join(".bashrc"), &content).unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(result.duplicates().len(), 1);
    let (digest, paths) = result.duplicates().iter().next().unwrap();
    assert_eq!(digest.extension, ".bashrc");
    assert_eq!(paths.len(), 2);
}

#[test]
fn test_extremely_long_paths() {
    let dir = tempdir().unwrap();

    let mut current_path = dir.path().to_path_buf();
    let folder_name = "a".repeat(50);

    // 6 levels of 50-char folders = 300+ chars.
    for i in 0..6 {
        current_path = current_path.join(format!("{}_{}", i, folder_name));
        if let Err(e) = fs::create_dir(&current_path) {
            eprintln!(
                "Skipping extremely long path test: failed to create dir: {}",
                e
            );
            return;
        }
    }

    let file_path = current_path.join("file.txt");
    if let Err(e) = File::create(&file_path).and_then(|mut f| f.write_all(b"content")) {
        eprintln!(
            "Skipping extremely long path test: failed to create file: {}",
            e
        );
        return;
    }

    File::create(dir.path().join("duplicate.txt"))
        .unwrap()
        .write_all(b"content")
        .unwrap();

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(result.duplicates().len(), 1);
    assert!(result.duplicates().contains_path(&file_path));
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("real.txt");
    fs::write(&target, b"linked content").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(result.total_files(), 1);
    assert!(!result.has_duplicates());
}
