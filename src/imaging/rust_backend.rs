//! Pure Rust codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only, no full decode) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::load_from_memory` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | EXIF read | `kamadak-exif`, see [`exif`](super::exif) |
//! | EXIF carry-through | `ImageEncoder::set_exif_metadata` on the JPEG encoder |

use super::backend::{BackendError, Dimensions, ExifTags, ImageBackend};
use super::exif;
use super::params::{OutputFormat, ResizeParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, ImageReader};
use std::io::Cursor;

/// Largest TIFF block that fits one JPEG APP1 segment after the
/// `Exif\0\0` header.
const MAX_JPEG_EXIF: usize = u16::MAX as usize - 2 - 6;

/// Pure Rust backend using the `image` crate ecosystem.
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

fn reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to sniff format: {e}")))
}

/// Decode an in-memory image.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    reader(source)?
        .decode()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {e}")))
}

/// Encode `img`, writing `exif` (a raw TIFF-structured block) into the
/// output when given.
fn encode(
    img: &DynamicImage,
    params: &ResizeParams,
    exif: Option<Vec<u8>>,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    match params.format {
        OutputFormat::Jpeg => {
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, params.quality.as_u8());
            if let Some(block) = exif {
                if let Err(e) = encoder.set_exif_metadata(block) {
                    tracing::warn!(error = %e, "encoder cannot carry EXIF");
                }
            }
            // JPEG has no alpha channel
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
        }
    }
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(source)?.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {e}"))
        })?;
        Ok(Dimensions { width, height })
    }

    fn read_exif(&self, source: &[u8]) -> Result<ExifTags, BackendError> {
        exif::read_tags(source)
    }

    fn resize(&self, source: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        let exif = if params.preserve_metadata {
            exif::raw_block(source).filter(|block| {
                let fits = block.len() <= MAX_JPEG_EXIF;
                if !fits {
                    tracing::warn!(bytes = block.len(), "EXIF block too large to carry over");
                }
                fits
            })
        } else {
            None
        };
        encode(&resized, params, exif)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::imaging::exif::tests::{test_exif_block, test_jpeg, test_jpeg_with_exif};

    fn params(width: u32, height: u32, preserve_metadata: bool) -> ResizeParams {
        ResizeParams {
            width,
            height,
            format: OutputFormat::Jpeg,
            quality: Quality::maximum(),
            preserve_metadata,
        }
    }

    fn test_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, _| {
            image::Rgba([(x % 256) as u8, 0, 0, 128])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let backend = RustBackend::new();
        let dims = backend.identify(&test_jpeg(200, 150)).unwrap();
        assert_eq!(dims.as_tuple(), (200, 150));
    }

    #[test]
    fn identify_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.identify(b"definitely not an image").is_err());
    }

    #[test]
    fn resize_produces_exact_dimensions() {
        let backend = RustBackend::new();
        let out = backend
            .resize(&test_jpeg(400, 300), &params(256, 192, false))
            .unwrap();

        assert_eq!(&out[0..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 192));
    }

    #[test]
    fn resize_png_with_alpha_to_jpeg() {
        let backend = RustBackend::new();
        let out = backend
            .resize(&test_png(64, 32), &params(32, 16, true))
            .unwrap();
        assert_eq!(
            image::guess_format(&out).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn resize_is_deterministic() {
        let backend = RustBackend::new();
        let source = test_jpeg(120, 90);
        let first = backend.resize(&source, &params(64, 48, true)).unwrap();
        let second = backend.resize(&source, &params(64, 48, true)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn resize_carries_exif_when_requested() {
        let backend = RustBackend::new();
        let source = test_jpeg_with_exif(120, 90, "Harbour at dusk");

        let kept = backend.resize(&source, &params(64, 48, true)).unwrap();
        let tags = backend.read_exif(&kept).unwrap();
        assert!(tags["ImageDescription"].contains("Harbour at dusk"));

        let stripped = backend.resize(&source, &params(64, 48, false)).unwrap();
        assert!(backend.read_exif(&stripped).unwrap().is_empty());
    }

    #[test]
    fn oversized_exif_is_dropped_not_fatal() {
        // PNG chunks can hold far more EXIF than one JPEG segment.
        let description = "x".repeat(70_000);
        let img = image::RgbImage::from_pixel(40, 30, image::Rgb([10, 20, 30]));
        let mut source = Vec::new();
        let mut encoder = image::codecs::png::PngEncoder::new(&mut source);
        encoder
            .set_exif_metadata(test_exif_block(&description))
            .unwrap();
        encoder
            .write_image(img.as_raw(), 40, 30, image::ExtendedColorType::Rgb8)
            .unwrap();
        assert!(RustBackend::new().read_exif(&source).unwrap().contains_key("ImageDescription"));

        let resized = RustBackend::new()
            .resize(&source, &params(20, 15, true))
            .unwrap();
        assert_eq!(RustBackend::new().identify(&resized).unwrap().as_tuple(), (20, 15));
        assert!(RustBackend::new().read_exif(&resized).unwrap().is_empty());
    }

    #[test]
    fn resize_garbage_errors() {
        let backend = RustBackend::new();
        let result = backend.resize(b"nope", &params(10, 10, false));
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn read_exif_synthetic_returns_empty() {
        let backend = RustBackend::new();
        assert!(backend.read_exif(&test_jpeg(10, 10)).unwrap().is_empty());
    }
}
