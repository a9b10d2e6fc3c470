//! Fixtures for the integration tests.
//!
//! The image generators are the ones the unit tests use, compiled into this
//! test crate from the same source file.
#![allow(dead_code)]

#[path = "../../src/test_helpers.rs"]
mod fixtures;

pub use fixtures::{jpeg_bytes, with_exif_orientation};

use std::fs;
use std::path::{Path, PathBuf};

pub fn write(root: &Path, rel: &str, bytes: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, bytes).unwrap();
    path
}

/// Leftover replacement temp files anywhere under `root`.
pub fn stray_temp_files(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .map(|e| e.into_path())
        .collect()
}
