//! Pure Rust decode/resize pipeline with format-specific encoders.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF) | `image` crate decoders |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `mozjpeg` (progressive, optimized Huffman tables) |
//! | Encode → PNG | `imagequant` palette at the quality, then `oxipng` reductions |
//! | Encode → WebP | `webp` (libwebp, lossy) |
//!
//! Embedded orientation is applied before anything else, so the stored
//! pixels always match how the original was displayed. The re-encoded file
//! carries no orientation tag of its own.

use super::backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
use super::params::{OutputFormat, Quality, ReencodeParams};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{ColorType, DynamicImage, ImageDecoder, ImageError, ImageReader, RgbaImage};
use mozjpeg::{ColorSpace, Compress};
use std::path::Path;

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, e: ImageError) -> BackendError {
    match e {
        ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::Decode(format!("{}: {}", path.display(), other)),
    }
}

fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Open a decoder for `path`, sniffing the format from content.
fn open_decoder(path: &Path) -> Result<impl ImageDecoder, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| decode_error(path, e))
}

/// Load, decode, and orient an image.
fn load_oriented(path: &Path) -> Result<DynamicImage, BackendError> {
    let mut decoder = open_decoder(path)?;
    // A malformed orientation tag is not worth failing the file over.
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
    img.apply_orientation(orientation);
    Ok(img)
}

fn encode_error(format: &str, e: impl std::fmt::Display) -> BackendError {
    BackendError::Encode(format!("{format} encode failed: {e}"))
}

/// JPEG has no alpha channel: flatten to RGB, or grayscale for gray sources.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let (color_space, pixels) = if img.color().has_color() {
        (ColorSpace::JCS_RGB, img.to_rgb8().into_raw())
    } else {
        (ColorSpace::JCS_GRAYSCALE, img.to_luma8().into_raw())
    };

    let mut compress = Compress::new(color_space);
    compress.set_size(img.width() as usize, img.height() as usize);
    compress.set_quality(quality.value() as f32);
    compress.set_progressive_mode();
    compress.set_optimize_coding(true);

    let mut started = compress
        .start_compress(Vec::new())
        .map_err(|e| encode_error("JPEG", e))?;
    started
        .write_scanlines(&pixels)
        .map_err(|e| encode_error("JPEG", e))?;
    started.finish().map_err(|e| encode_error("JPEG", e))
}

/// Deflate at the strongest setting, then lossless palette / bit-depth /
/// color-type reduction through oxipng.
fn encode_png_lossless(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| encode_error("PNG", e))?;

    let mut options = oxipng::Options::max_compression();
    options.palette_reduction = true;
    options.bit_depth_reduction = true;
    options.color_type_reduction = true;
    options.grayscale_reduction = true;
    oxipng::optimize_from_memory(&buf, &options).map_err(|e| encode_error("PNG", e))
}

/// Map the image onto at most 256 colors chosen for `quality`.
///
/// The remapped image holds no more colors than the palette, so oxipng's
/// palette reduction stores it as an indexed PNG.
fn quantize(img: &DynamicImage, quality: Quality) -> Result<DynamicImage, imagequant::Error> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels: Vec<imagequant::RGBA> = rgba
        .pixels()
        .map(|p| imagequant::RGBA::new(p[0], p[1], p[2], p[3]))
        .collect();

    let mut attr = imagequant::new();
    attr.set_quality(0, quality.value() as u8)?;
    let mut frame = attr.new_image(pixels, width as usize, height as usize, 0.0)?;
    let mut result = attr.quantize(&mut frame)?;
    result.set_dithering_level(1.0)?;
    let (palette, indexes) = result.remapped(&mut frame)?;

    let mut remapped = RgbaImage::new(width, height);
    for (pixel, &index) in remapped.pixels_mut().zip(&indexes) {
        let c = palette[index as usize];
        *pixel = image::Rgba([c.r, c.g, c.b, c.a]);
    }
    Ok(DynamicImage::ImageRgba8(remapped))
}

/// Lossy palette PNG at `quality`, or the lossless encoding when that is
/// no larger.
fn encode_png(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let img = match img.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => DynamicImage::ImageRgba16(img.to_rgba16()),
        _ => img.clone(),
    };
    let lossless = encode_png_lossless(&img)?;

    let quantized = match quantize(&img, quality) {
        Ok(remapped) => encode_png_lossless(&remapped)?,
        Err(e) => {
            tracing::debug!("palette quantization skipped: {e}");
            return Ok(lossless);
        }
    };
    Ok(if quantized.len() < lossless.len() {
        quantized
    } else {
        lossless
    })
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let (width, height) = (img.width(), img.height());
    let q = quality.value() as f32;
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
        encoder.encode_simple(false, q)
    } else {
        let rgb = img.to_rgb8();
        let encoder = webp::Encoder::from_rgb(rgb.as_raw(), width, height);
        encoder.encode_simple(false, q)
    };
    let memory = encoded.map_err(|e| encode_error("WebP", format!("{e:?}")))?;
    Ok(memory.to_vec())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let mut decoder = open_decoder(path)?;
        let (width, height) = decoder.dimensions();
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        Ok(if swaps_axes(orientation) {
            Dimensions {
                width: height,
                height: width,
            }
        } else {
            Dimensions { width, height }
        })
    }

    fn reencode(&self, params: &ReencodeParams) -> Result<EncodedImage, BackendError> {
        let mut img = load_oriented(&params.source)?;
        if (img.width(), img.height()) != (params.width, params.height) {
            img = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        }

        let bytes = match params.format {
            OutputFormat::Jpeg => encode_jpeg(&img, params.quality)?,
            OutputFormat::Png => encode_png(&img, params.quality)?,
            OutputFormat::WebP => encode_webp(&img, params.quality)?,
        };

        Ok(EncodedImage {
            bytes,
            width: img.width(),
            height: img.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        decoded_dimensions, jpeg_bytes, noise_rgb, with_exif_orientation, write_flat_png,
        write_gif, write_jpeg, write_png,
    };
    use tempfile::TempDir;

    fn params(source: &Path, width: u32, height: u32, format: OutputFormat) -> ReencodeParams {
        ReencodeParams {
            source: source.to_path_buf(),
            width,
            height,
            format,
            quality: Quality::new(72),
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        write_jpeg(&path, 200, 150, 90);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_nonexistent_file_is_io_error() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn identify_garbage_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let result = RustBackend::new().identify(&path);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn identify_swaps_axes_for_rotated_exif() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rotated.jpg");
        // Orientation 6: stored landscape, displayed portrait.
        std::fs::write(&path, with_exif_orientation(&jpeg_bytes(200, 100, 90), 6)).unwrap();

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 100, height: 200 });
    }

    #[test]
    fn reencode_applies_orientation_to_pixels() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rotated.jpg");
        std::fs::write(&path, with_exif_orientation(&jpeg_bytes(200, 100, 90), 6)).unwrap();

        let encoded = RustBackend::new()
            .reencode(&params(&path, 100, 200, OutputFormat::Jpeg))
            .unwrap();

        assert_eq!((encoded.width, encoded.height), (100, 200));
        let out = tmp.path().join("out.jpg");
        std::fs::write(&out, &encoded.bytes).unwrap();
        assert_eq!(decoded_dimensions(&out), (100, 200));
    }

    #[test]
    fn reencode_jpeg_downscales() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.jpg");
        write_jpeg(&path, 400, 300, 95);

        let encoded = RustBackend::new()
            .reencode(&params(&path, 240, 180, OutputFormat::Jpeg))
            .unwrap();

        assert_eq!((encoded.width, encoded.height), (240, 180));
        let out = tmp.path().join("out.jpg");
        std::fs::write(&out, &encoded.bytes).unwrap();
        assert_eq!(decoded_dimensions(&out), (240, 180));
    }

    #[test]
    fn reencode_same_size_keeps_dimensions() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("small.png");
        write_png(&path, 80, 60);

        let encoded = RustBackend::new()
            .reencode(&params(&path, 80, 60, OutputFormat::Png))
            .unwrap();

        let out = tmp.path().join("out.png");
        std::fs::write(&out, &encoded.bytes).unwrap();
        assert_eq!(decoded_dimensions(&out), (80, 60));
    }

    fn with_quality(mut params: ReencodeParams, quality: u32) -> ReencodeParams {
        params.quality = Quality::new(quality);
        params
    }

    #[test]
    fn reencode_png_few_colors_is_exact() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("flag.png");
        write_flat_png(&path, 48, 32);

        let encoded = RustBackend::new()
            .reencode(&params(&path, 48, 32, OutputFormat::Png))
            .unwrap();

        let before = image::open(&path).unwrap().to_rgba8();
        let after = image::load_from_memory(&encoded.bytes).unwrap().to_rgba8();
        assert_eq!(before, after);
    }

    #[test]
    fn reencode_png_keeps_transparency() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("icon.png");
        write_png(&path, 32, 32);

        let encoded = RustBackend::new()
            .reencode(&params(&path, 32, 32, OutputFormat::Png))
            .unwrap();

        let after = image::load_from_memory(&encoded.bytes).unwrap().to_rgba8();
        let corner = after.get_pixel(0, 0)[3];
        assert!(corner > 0 && corner < 255, "alpha {corner}");
        assert!(after.get_pixel(31, 31)[3] >= 240);
    }

    #[test]
    fn png_quality_controls_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("noise.png");
        noise_rgb(96, 96).save(&path).unwrap();
        let backend = RustBackend::new();

        let low = backend
            .reencode(&with_quality(params(&path, 96, 96, OutputFormat::Png), 10))
            .unwrap();
        let high = backend
            .reencode(&with_quality(params(&path, 96, 96, OutputFormat::Png), 100))
            .unwrap();

        assert!(low.len() <= high.len(), "q10 {} > q100 {}", low.len(), high.len());
        // A palette costs at most one byte per pixel; full RGB noise costs three.
        assert!(high.len() < 96 * 96 * 2);
        let decoded = image::load_from_memory(&low.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (96, 96));
    }

    #[test]
    fn reencode_jpeg_is_progressive() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        write_jpeg(&path, 120, 90, 95);

        let encoded = RustBackend::new()
            .reencode(&params(&path, 120, 90, OutputFormat::Jpeg))
            .unwrap();

        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        // SOF2 starts a progressive frame.
        assert!(encoded.bytes.windows(2).any(|w| w == [0xFF, 0xC2]));
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 90));
    }

    #[test]
    fn jpeg_quality_controls_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        write_jpeg(&path, 160, 120, 100);
        let backend = RustBackend::new();

        let low = backend
            .reencode(&with_quality(params(&path, 160, 120, OutputFormat::Jpeg), 30))
            .unwrap();
        let high = backend
            .reencode(&with_quality(params(&path, 160, 120, OutputFormat::Jpeg), 95))
            .unwrap();

        assert!(low.len() < high.len());
    }

    #[test]
    fn reencode_gif_source_as_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("anim.gif");
        write_gif(&path, 40, 30);

        let encoded = RustBackend::new()
            .reencode(&params(&path, 40, 30, OutputFormat::Jpeg))
            .unwrap();

        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!((encoded.width, encoded.height), (40, 30));
    }

    #[test]
    fn reencode_webp_output_decodes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.png");
        write_png(&path, 64, 48);

        let encoded = RustBackend::new()
            .reencode(&params(&path, 64, 48, OutputFormat::WebP))
            .unwrap();

        assert_eq!(&encoded.bytes[..4], b"RIFF");
        assert_eq!(&encoded.bytes[8..12], b"WEBP");
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn reencode_png_source_as_jpeg_drops_alpha() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("alpha.png");
        write_png(&path, 16, 16);

        let encoded = RustBackend::new()
            .reencode(&params(&path, 16, 16, OutputFormat::Jpeg))
            .unwrap();

        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn reencode_missing_file_errors() {
        let result = RustBackend::new().reencode(&params(
            Path::new("/nonexistent/a.jpg"),
            1,
            1,
            OutputFormat::Jpeg,
        ));
        assert!(result.is_err());
    }
}
