/*!
 * Tests for file system utilities
 */

use dubwai::file_utils::FileManager;

use crate::common;

#[test]
fn test_fileExists_withExistingFile_shouldReturnTrue() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "exists.txt", "content").unwrap();

    assert!(FileManager::file_exists(&path));
    assert!(!FileManager::file_exists(dir.path().join("missing.txt")));
    // A directory is not a file
    assert!(!FileManager::file_exists(dir.path()));
}

#[test]
fn test_ensureDir_withNestedPath_shouldCreateIt() {
    let dir = common::create_temp_dir().unwrap();
    let nested = dir.path().join("a").join("b").join("c");

    assert!(!FileManager::dir_exists(&nested));
    FileManager::ensure_dir(&nested).unwrap();
    assert!(FileManager::dir_exists(&nested));

    // Idempotent on an existing directory
    FileManager::ensure_dir(&nested).unwrap();
}

#[test]
fn test_generateOutputPath_shouldAppendDubbedSuffix() {
    let out = FileManager::generate_output_path("movie.srt", "/out", "wav");
    assert_eq!(out.to_string_lossy(), "/out/movie.dubbed.wav");
}

#[test]
fn test_writeToFile_thenReadToString_shouldRoundTrip() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("sub").join("note.txt");

    FileManager::write_to_file(&path, "hello dubbing").unwrap();
    let content = FileManager::read_to_string(&path).unwrap();
    assert_eq!(content, "hello dubbing");
}
