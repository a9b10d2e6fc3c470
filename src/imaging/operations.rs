//! High-level image operations.
//!
//! These functions combine calculations with backend execution: identify the
//! source, decide the output size and encoder from the policy, and ask the
//! backend for the bytes.

use super::backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
use super::calculations::fit_inside;
use super::params::{FormatPolicy, OutputFormat, ReencodeParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Plan a re-encode without executing it.
///
/// The encoder follows the file extension; the output size is the oriented
/// size fitted inside the policy's bound (unchanged when already inside).
pub fn plan_reencode(source: &Path, oriented: Dimensions, policy: &FormatPolicy) -> ReencodeParams {
    let format = OutputFormat::from_path(source);
    let (width, height) = fit_inside((oriented.width, oriented.height), policy.max_dimension);

    ReencodeParams {
        source: source.to_path_buf(),
        width,
        height,
        format,
        quality: policy.quality_for(format),
    }
}

/// Identify, plan, and re-encode `source` under `policy`.
pub fn reencode_image(
    backend: &impl ImageBackend,
    source: &Path,
    policy: &FormatPolicy,
) -> Result<EncodedImage> {
    let oriented = backend.identify(source)?;
    let params = plan_reencode(source, oriented, policy);
    backend.reencode(&params)
}
