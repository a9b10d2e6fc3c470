//! Recursive discovery of image files under a set of roots.
//!
//! Each root may be a directory (walked recursively) or a single file. The
//! result is a flat list of absolute paths in a stable order: roots in the
//! order given, and within a directory root, entries sorted by file name at
//! every level. The dedup pass relies on this order to decide which copy of
//! a duplicated file survives, so reruns must see the same sequence.
//!
//! ## Failure handling
//!
//! Anything that goes wrong below a root (unreadable directory, entry that
//! vanished between listing and stat) is recorded as a [`WalkWarning`] and
//! skipped. A root that does not exist is also skipped. Only when *no* root
//! is accessible does the walk fail, with [`WalkError::NoAccessibleRoot`].
//!
//! Symbolic links are followed. Every file is reported under its resolved
//! path, so a file reachable from two overlapping roots, or through a link
//! and directly, is reported once, at its first position. A link cycle is a
//! warning like any other unreadable entry.

use crate::types::AssetRecord;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("none of the configured roots are accessible: {}", display_roots(.roots))]
    NoAccessibleRoot { roots: Vec<PathBuf> },
}

fn display_roots(roots: &[PathBuf]) -> String {
    if roots.is_empty() {
        return "(no roots configured)".to_string();
    }
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Case-insensitive set of recognized file extensions.
///
/// Extensions are stored lowercase without the leading dot, so `".JPG"`,
/// `"jpg"` and `"Jpg"` all describe the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter(BTreeSet<String>);

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        )
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.0.contains(&e.to_ascii_lowercase()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Something below a root that could not be read and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Output of a walk.
#[derive(Debug, Default)]
pub struct WalkResult {
    pub assets: Vec<AssetRecord>,
    pub warnings: Vec<WalkWarning>,
    /// Roots that did not exist or could not be resolved.
    pub missing_roots: Vec<PathBuf>,
}

/// Walk `roots` and collect every regular file accepted by `filter`.
pub fn walk(roots: &[PathBuf], filter: &ExtensionFilter) -> Result<WalkResult, WalkError> {
    let mut result = WalkResult::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut accessible = 0usize;

    for root in roots {
        let resolved = match fs::canonicalize(root) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "skipping inaccessible root");
                result.missing_roots.push(root.clone());
                continue;
            }
        };
        accessible += 1;
        walk_root(&resolved, filter, &mut seen, &mut result);
    }

    if accessible == 0 {
        return Err(WalkError::NoAccessibleRoot {
            roots: roots.to_vec(),
        });
    }
    Ok(result)
}

fn walk_root(
    root: &Path,
    filter: &ExtensionFilter,
    seen: &mut HashSet<PathBuf>,
    result: &mut WalkResult,
) {
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.into());
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                result.warnings.push(WalkWarning {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !filter.matches(entry.path()) {
            continue;
        }

        // Resolved, so a file seen through a link is the file it points at.
        let resolved = entry
            .metadata()
            .map_err(|e| e.to_string())
            .and_then(|m| {
                fs::canonicalize(entry.path())
                    .map(|p| (p, m))
                    .map_err(|e| e.to_string())
            });
        let (path, metadata) = match resolved {
            Ok(found) => found,
            Err(message) => {
                tracing::warn!(path = %entry.path().display(), error = %message, "skipping entry");
                result.warnings.push(WalkWarning {
                    path: entry.path().to_path_buf(),
                    message,
                });
                continue;
            }
        };

        if seen.insert(path.clone()) {
            result.assets.push(AssetRecord {
                path,
                size_bytes: metadata.len(),
            });
        }
    }
}
