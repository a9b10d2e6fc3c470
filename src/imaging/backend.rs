//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the compress pass
//! needs: identify (oriented dimensions, no full decode) and reencode
//! (decode, orient, resize, encode to bytes in memory).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use a mock that
//! records calls and returns canned encodes.

use super::params::ReencodeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions as displayed, i.e. after applying embedded orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Encoded output held in memory, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Oriented dimensions of the image at `path`.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Produce the re-encoded bytes described by `params`.
    fn reencode(&self, params: &ReencodeParams) -> Result<EncodedImage, BackendError>;
}
