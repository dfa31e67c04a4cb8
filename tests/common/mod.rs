//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Discovery deadline used by tests that expect to find a device
pub fn test_timeout() -> Duration {
    Duration::from_millis(500)
}

/// Read every record of a CSV file, header included
pub fn read_csv(path: &Path, delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_path(path)
        .expect("output file should be readable");
    reader
        .records()
        .map(|r| r.expect("valid CSV record").iter().map(String::from).collect())
        .collect()
}

/// The single file a run left in `dir`
pub fn single_output_file(dir: &Path) -> PathBuf {
    let files: Vec<_> = std::fs::read_dir(dir)
        .expect("output directory should exist")
        .map(|e| e.expect("readable entry").path())
        .collect();
    assert_eq!(files.len(), 1, "expected exactly one output file: {:?}", files);
    files.into_iter().next().expect("one file")
}
