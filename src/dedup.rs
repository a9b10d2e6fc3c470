//! Exact-duplicate removal.
//!
//! Given digested assets in walker order, the first file seen with a digest
//! is kept and every later file with the same digest is deleted:
//!
//! ```text
//! a.jpg  d1  → kept
//! b.jpg  d2  → kept
//! c.jpg  d1  → removed (kept: a.jpg)
//! ```
//!
//! The decision runs on a single thread against a [`DigestTable`] owned by
//! the caller, so "first occurrence wins" is evaluated against one
//! consistent view. Hashing (the expensive part) happens beforehand in
//! parallel; see [`crate::digest::digest_assets`].
//!
//! There is no rollback. An interrupted run leaves already-deleted
//! duplicates gone and every survivor in place, and running the pass again
//! removes nothing further once no duplicate digests remain.

use crate::digest::ContentDigest;
use crate::types::{DigestedAsset, Removal};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Digest → path of the file kept for that digest.
#[derive(Debug, Default)]
pub struct DigestTable {
    kept: HashMap<ContentDigest, PathBuf>,
}

/// Result of offering one file to the [`DigestTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// First file with this digest; it survives.
    Keep,
    /// Same bytes as an earlier file, which survives instead.
    Duplicate { kept: PathBuf },
}

impl DigestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` under `digest`, or report the earlier survivor.
    ///
    /// Offering the survivor's own path again yields [`Verdict::Keep`]; a
    /// file is never a duplicate of itself.
    pub fn observe(&mut self, digest: ContentDigest, path: &Path) -> Verdict {
        match self.kept.entry(digest) {
            Entry::Vacant(slot) => {
                slot.insert(path.to_path_buf());
                Verdict::Keep
            }
            Entry::Occupied(slot) if slot.get() == path => Verdict::Keep,
            Entry::Occupied(slot) => Verdict::Duplicate {
                kept: slot.get().clone(),
            },
        }
    }

    /// Number of distinct digests seen.
    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

/// A duplicate that could not be deleted.
#[derive(Debug)]
pub struct RemovalFailure {
    pub removal: Removal,
    pub error: io::Error,
}

/// Outcome of one dedup pass.
#[derive(Debug, Default)]
pub struct DedupReport {
    /// Files that were hashed and considered.
    pub scanned: usize,
    /// Distinct contents among them.
    pub unique: usize,
    /// Duplicates deleted (or, in a dry run, that would be deleted).
    pub removed: Vec<Removal>,
    pub failed: Vec<RemovalFailure>,
}

impl DedupReport {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.removed.iter().map(|r| r.size_bytes).sum()
    }
}

/// Walk `assets` in order and delete every repeat of an already-seen digest.
///
/// With `dry_run` set, duplicates are reported but left on disk. A failed
/// deletion is logged and recorded; the pass continues with the next file.
pub fn deduplicate(
    assets: &[DigestedAsset],
    table: &mut DigestTable,
    dry_run: bool,
) -> DedupReport {
    let mut report = DedupReport {
        scanned: assets.len(),
        ..DedupReport::default()
    };

    for DigestedAsset { asset, digest } in assets {
        let Verdict::Duplicate { kept } = table.observe(*digest, &asset.path) else {
            continue;
        };
        let removal = Removal {
            duplicate: asset.path.clone(),
            kept,
            size_bytes: asset.size_bytes,
        };

        if dry_run {
            report.removed.push(removal);
            continue;
        }

        match fs::remove_file(&removal.duplicate) {
            Ok(()) => {
                tracing::info!(
                    duplicate = %removal.duplicate.display(),
                    kept = %removal.kept.display(),
                    "removed duplicate"
                );
                report.removed.push(removal);
            }
            Err(error) => {
                tracing::warn!(
                    path = %removal.duplicate.display(),
                    error = %error,
                    "failed to remove duplicate"
                );
                report.failed.push(RemovalFailure { removal, error });
            }
        }
    }

    report.unique = table.len();
    report
}
