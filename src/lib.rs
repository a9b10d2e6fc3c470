//! # Asset Press
//!
//! Shrinks the image assets of a static site in place, in two passes:
//!
//! ```text
//! 1. Dedup     portfolio/  →  byte-identical repeats deleted (first wins)
//! 2. Compress  targets     →  every image re-encoded, kept only if smaller
//! ```
//!
//! Both passes work on the files where they are: nothing is copied to an
//! output directory, and re-running either pass on its own output changes
//! nothing further.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`walk`] | Recursive, sorted, extension-filtered enumeration of one or more roots |
//! | [`digest`] | Streaming SHA-256 of file contents, parallel over a batch |
//! | [`dedup`] | First-occurrence-wins removal of exact duplicates |
//! | [`imaging`] | Decode, orient, fit inside a bound, re-encode per format |
//! | [`compress`] | Encode → compare → commit-or-discard, with atomic replacement |
//! | [`pipeline`] | The two passes, progress events, and run statistics |
//! | [`config`] | `asset-press.toml` loading, validation, and merging |
//! | [`types`] | Records passed between passes |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Deterministic Survivors
//!
//! The walker sorts entries by file name at every level, so "first
//! occurrence" in the dedup pass means the same file on every machine and
//! every run. Hashing is parallel but the keep-or-delete decision is made
//! on one thread against an explicit [`dedup::DigestTable`].
//!
//! ## Never Grow, Never Half-Write
//!
//! A re-encoded image replaces the original only when it is smaller than
//! `original × min_savings_ratio` (0.98 by default). The replacement is a
//! temp file in the same directory renamed over the original, so a crash
//! leaves either the old file or the new one, never a partial write and
//! never a missing asset.
//!
//! ## Orientation Is Baked In
//!
//! EXIF orientation is applied to the pixels before resizing and encoding.
//! The output carries no orientation tag, and displays the same way the
//! original did.

pub mod compress;
pub mod config;
pub mod dedup;
pub mod digest;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise the level is `warn`, or `info` with
/// `verbose`. Calling this twice is harmless: the second call is ignored.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
