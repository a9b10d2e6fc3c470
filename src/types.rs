//! Value records passed between the pipeline passes.
//!
//! Every record is created by the pass that discovers it and dropped at the
//! end of the run. Nothing here is persisted; re-running the tool rebuilds
//! all of it from the filesystem.

use crate::digest::ContentDigest;
use serde::Serialize;
use std::path::PathBuf;

/// A single file found by the tree walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// An [`AssetRecord`] plus the SHA-256 digest of its bytes.
///
/// Two digested assets with equal digests are byte-identical content,
/// regardless of where they live or what they are called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestedAsset {
    pub asset: AssetRecord,
    pub digest: ContentDigest,
}

/// A duplicate that the dedup pass removed (or would remove, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removal {
    pub duplicate: PathBuf,
    pub kept: PathBuf,
    pub size_bytes: u64,
}

/// What happened to one file in the compress pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionOutcome {
    pub path: PathBuf,
    pub original_size_bytes: u64,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The re-encoded bytes replaced the original.
    Optimized { new_size_bytes: u64 },
    /// The re-encode did not clear the savings margin; file left untouched.
    Skipped { candidate_size_bytes: u64 },
}

impl CompressionOutcome {
    /// Bytes saved by this file; zero unless it was optimized.
    pub fn saved_bytes(&self) -> u64 {
        match self.status {
            OutcomeStatus::Optimized { new_size_bytes } => {
                self.original_size_bytes.saturating_sub(new_size_bytes)
            }
            OutcomeStatus::Skipped { .. } => 0,
        }
    }

    pub fn is_optimized(&self) -> bool {
        matches!(self.status, OutcomeStatus::Optimized { .. })
    }
}
