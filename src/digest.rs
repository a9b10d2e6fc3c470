//! Content hashing for duplicate detection.
//!
//! Files are identified by the SHA-256 of their full byte content. The file
//! is streamed through the hasher in fixed-size chunks, so large originals
//! are never held in memory whole.
//!
//! Hashing is independent per file, so [`digest_assets`] fans out over the
//! rayon pool. The output keeps the input order: duplicate-survivor selection
//! downstream depends on it.

use crate::types::{AssetRecord, DigestedAsset};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// SHA-256 digest of a file's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// SHA-256 of everything readable from `reader`.
pub fn hash_reader(mut reader: impl io::Read) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(ContentDigest(hasher.finalize().into()))
}

/// SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> io::Result<ContentDigest> {
    let file = File::open(path)?;
    hash_reader(BufReader::with_capacity(64 * 1024, file))
}

/// A file that could not be hashed (vanished or became unreadable after the
/// walk found it).
#[derive(Debug)]
pub struct HashFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Hash every asset in parallel, preserving input order.
///
/// Unreadable files are returned separately instead of failing the batch.
pub fn digest_assets(assets: Vec<AssetRecord>) -> (Vec<DigestedAsset>, Vec<HashFailure>) {
    let results: Vec<Result<DigestedAsset, HashFailure>> = assets
        .into_par_iter()
        .map(|asset| match hash_file(&asset.path) {
            Ok(digest) => Ok(DigestedAsset { asset, digest }),
            Err(error) => Err(HashFailure {
                path: asset.path,
                error,
            }),
        })
        .collect();

    let mut digested = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(d) => digested.push(d),
            Err(failure) => {
                tracing::warn!(
                    path = %failure.path.display(),
                    error = %failure.error,
                    "skipping unreadable file"
                );
                failures.push(failure);
            }
        }
    }
    (digested, failures)
}
