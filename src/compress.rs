//! In-place recompression of a single image.
//!
//! Each file goes through three steps:
//!
//! ```text
//! encode   identify → orient → fit inside bound → encode per format (in memory)
//! compare  candidate < original × min_savings_ratio ?
//! commit   yes → write temp file beside the original, rename over it
//!          no  → discard candidate, file untouched (skipped)
//! ```
//!
//! ## Crash safety
//!
//! The original is never deleted ahead of time. The candidate is written to
//! `.<name>.<random>.tmp` in the same directory, synced, given the
//! original's permissions, and renamed over the original. At any instant
//! the path holds either the untouched original or the complete new file.
//! An interrupted run can leave a stray `.tmp` file behind, which no
//! extension filter picks up.

use crate::imaging::{BackendError, FormatPolicy, ImageBackend, reencode_image};
use crate::types::{CompressionOutcome, OutcomeStatus};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("cannot replace {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything the compression engine needs to decide about one file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionPolicy {
    pub formats: FormatPolicy,
    /// Commit only if `candidate < original * min_savings_ratio`.
    pub min_savings_ratio: f64,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            formats: FormatPolicy::default(),
            min_savings_ratio: 0.98,
        }
    }
}

/// Outcome of comparing a candidate encode against the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Commit,
    Discard,
}

/// Commit only when the candidate is strictly below the margin threshold.
pub fn decide(original_size: u64, candidate_size: u64, min_savings_ratio: f64) -> Decision {
    if (candidate_size as f64) < (original_size as f64) * min_savings_ratio {
        Decision::Commit
    } else {
        Decision::Discard
    }
}

/// Recompress `path` in place under `policy`.
///
/// With `dry_run` set the decision is made and reported, but nothing is
/// written.
pub fn compress_file(
    backend: &impl ImageBackend,
    path: &Path,
    policy: &CompressionPolicy,
    dry_run: bool,
) -> Result<CompressionOutcome, CompressError> {
    let original_size = fs::metadata(path)
        .map_err(|source| CompressError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    let encoded = reencode_image(backend, path, &policy.formats)?;
    let candidate_size = encoded.len();

    let status = match decide(original_size, candidate_size, policy.min_savings_ratio) {
        Decision::Discard => OutcomeStatus::Skipped {
            candidate_size_bytes: candidate_size,
        },
        Decision::Commit => {
            if !dry_run {
                replace_atomically(path, &encoded.bytes).map_err(|source| {
                    CompressError::Replace {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
            }
            OutcomeStatus::Optimized {
                new_size_bytes: candidate_size,
            }
        }
    };

    Ok(CompressionOutcome {
        path: path.to_path_buf(),
        original_size_bytes: original_size,
        status,
    })
}

/// Replace the contents of `path` with `bytes` via temp file + rename.
///
/// On error the temporary file is removed and `path` is left as it was.
pub fn replace_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
        .to_string_lossy();

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    // Temp files are created owner-only; keep the original's mode instead.
    if let Ok(meta) = fs::metadata(path) {
        let mut perms = meta.permissions();
        if perms.readonly() {
            relax_readonly(path, &perms);
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
        }
        if let Err(e) = fs::set_permissions(tmp.path(), perms) {
            tracing::debug!(path = %path.display(), error = %e, "could not copy permissions");
        }
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Best-effort: some platforms refuse to rename over a read-only file.
fn relax_readonly(path: &Path, perms: &fs::Permissions) {
    let mut writable = perms.clone();
    #[allow(clippy::permissions_set_readonly_false)]
    writable.set_readonly(false);
    if let Err(e) = fs::set_permissions(path, writable) {
        tracing::debug!(path = %path.display(), error = %e, "could not relax permissions");
    }
}
