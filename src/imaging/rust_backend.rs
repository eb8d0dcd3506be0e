//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate, format sniffed from the bytes |
//! | Identify | `ImageReader::into_dimensions` (header only, no full decode) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Composite | `imageops::overlay` onto an opaque black RGBA canvas |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Both sources are decoded in parallel with `rayon::join`.

use super::backend::{BackendError, Dimensions, ImageBackend, Side};
use super::calculations::fits_canvas;
use super::params::ComposeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;

/// Canvas fill behind both halves. Opaque, so partially transparent edges
/// blend against black instead of leaking alpha into the JPEG.
const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

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

fn reader(side: Side, bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode {
            side,
            message: e.to_string(),
        })
}

/// Decode an in-memory image to pixels.
fn load_image(side: Side, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    reader(side, bytes)?
        .decode()
        .map_err(|e| BackendError::Decode {
            side,
            message: e.to_string(),
        })
}

/// Encode as baseline JPEG at the given quality.
fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, side: Side, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(side, bytes)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode {
                side,
                message: e.to_string(),
            })?;
        if width == 0 || height == 0 {
            return Err(BackendError::Decode {
                side,
                message: format!("image has no pixels ({width}x{height})"),
            });
        }
        Ok(Dimensions { width, height })
    }

    fn compose(&self, params: &ComposeParams) -> Result<Vec<u8>, BackendError> {
        let layout = params.layout;
        if !fits_canvas(layout.width(), layout.height) {
            return Err(BackendError::Surface {
                width: layout.width(),
                height: layout.height,
            });
        }

        let (left, right) = rayon::join(
            || load_image(Side::Left, params.left),
            || load_image(Side::Right, params.right),
        );
        let left = left?.resize_exact(layout.left_width, layout.height, FilterType::Lanczos3);
        let right = right?.resize_exact(layout.right_width, layout.height, FilterType::Lanczos3);

        let mut canvas = RgbaImage::from_pixel(layout.width(), layout.height, BACKGROUND);
        imageops::overlay(&mut canvas, &left.to_rgba8(), 0, 0);
        imageops::overlay(
            &mut canvas,
            &right.to_rgba8(),
            layout.right_offset() as i64,
            0,
        );

        encode_jpeg(&DynamicImage::ImageRgba8(canvas), params.quality.value())
    }
}
