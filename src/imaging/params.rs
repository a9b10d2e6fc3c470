//! Parameter types for re-encoding.
//!
//! These describe *what* to produce, not *how*. [`operations`](super::operations)
//! decides the parameters; the [`backend`](super::backend) does the pixel work.
//!
//! - [`Quality`]: lossy encoding quality, clamped to 1–100.
//! - [`OutputFormat`]: encoder family, chosen from the file extension.
//! - [`FormatPolicy`]: per-format quality plus the maximum dimension bound.
//! - [`ReencodeParams`]: everything one re-encode needs.

use std::path::{Path, PathBuf};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Encoder family used for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Pick the encoder from the file extension.
    ///
    /// `png` and `webp` map to their own encoders; anything else accepted by
    /// the compress pass (`jpg`, `jpeg`, or a configured extra) is written
    /// as JPEG.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Self::Png,
            "webp" => Self::WebP,
            _ => Self::Jpeg,
        }
    }
}

/// Format policy table: quality per encoder and the dimension bound.
///
/// Built once from config at startup and passed by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPolicy {
    pub jpeg: Quality,
    pub png: Quality,
    pub webp: Quality,
    /// Longest side allowed, in pixels. Larger images are downscaled.
    pub max_dimension: u32,
}

impl FormatPolicy {
    pub fn quality_for(&self, format: OutputFormat) -> Quality {
        match format {
            OutputFormat::Jpeg => self.jpeg,
            OutputFormat::Png => self.png,
            OutputFormat::WebP => self.webp,
        }
    }
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            jpeg: Quality::new(72),
            png: Quality::new(80),
            webp: Quality::new(68),
            max_dimension: 2400,
        }
    }
}

/// One re-encode: read `source`, orient, resize to `width`×`height`
/// (a no-op when that matches the oriented size), encode as `format`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReencodeParams {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}
