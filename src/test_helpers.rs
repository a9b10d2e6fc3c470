//! Shared test utilities: synthetic image fixtures.
//!
//! Images are generated on the fly with the `image` encoders so the test
//! suite needs no binary fixtures. Patterns are deliberately busy (not flat
//! fills) so that quality settings make a measurable size difference.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

/// A busy RGB pattern that compresses poorly at high quality.
pub fn pattern_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x.wrapping_mul(7) ^ y.wrapping_mul(13)) as u8,
            (x * y % 256) as u8,
            ((x + y) % 256) as u8,
        ])
    })
}

/// Encode [`pattern_rgb`] as a JPEG at `quality`.
pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let img = pattern_rgb(width, height);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

pub fn write_jpeg(path: &Path, width: u32, height: u32, quality: u8) {
    std::fs::write(path, jpeg_bytes(width, height, quality)).unwrap();
}

/// Write an RGBA PNG with a gradient and a semi-transparent corner.
pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if x < width / 4 && y < height / 4 { 128 } else { 255 };
        image::Rgba([(x * 4 % 256) as u8, (y * 4 % 256) as u8, 200, alpha])
    });
    img.save(path).unwrap();
}

/// Per-pixel hash noise: barely compressible without losing colors.
pub fn noise_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let h = (x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663)).wrapping_mul(2_654_435_761);
        let [r, g, b, _] = h.to_le_bytes();
        image::Rgb([r, g, b])
    })
}

/// Write an opaque PNG made of four solid quadrants.
pub fn write_flat_png(path: &Path, width: u32, height: u32) {
    let quadrants = [[220, 40, 40], [40, 160, 60], [30, 60, 200], [250, 250, 250]];
    let img = RgbImage::from_fn(width, height, |x, y| {
        let i = usize::from(x >= width / 2) + 2 * usize::from(y >= height / 2);
        image::Rgb(quadrants[i])
    });
    img.save(path).unwrap();
}

/// Write [`pattern_rgb`] as a GIF.
pub fn write_gif(path: &Path, width: u32, height: u32) {
    DynamicImage::ImageRgb8(pattern_rgb(width, height))
        .to_rgba8()
        .save(path)
        .unwrap();
}

/// Insert an EXIF APP1 segment carrying `orientation` right after SOI.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A\x00\x00\x00\x08"); // big-endian, IFD0 at 8
    tiff.extend_from_slice(&1u16.to_be_bytes()); // one entry
    tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes()); // count
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]); // value padding
    tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Dimensions of the image stored at `path`, as decoded (no orientation).
pub fn decoded_dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}
