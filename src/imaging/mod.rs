//! Image processing: decode, orient, fit inside a bound, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageDecoder::dimensions` + EXIF orientation |
//! | **Orient** | `DynamicImage::apply_orientation` |
//! | **Fit inside** | [`fit_inside`] + Lanczos3 |
//! | **Encode** | JPEG (`mozjpeg`), PNG (`imagequant` + `oxipng`), WebP (`webp`) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
pub use calculations::fit_inside;
pub use operations::{plan_reencode, reencode_image};
pub use params::{FormatPolicy, OutputFormat, Quality, ReencodeParams};
pub use rust_backend::RustBackend;
