//! Shared test utilities for the hug-reel test suite.
//!
//! Builds small in-memory image fixtures so tests never depend on files
//! checked into the repo.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let record = png_record(100, 100, [255, 0, 0, 255]);
//! assert_eq!(record.mime_type(), "image/png");
//! ```

use crate::imaging::{ImageRecord, decode};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Image fixtures
// =========================================================================

/// Encode a solid-color RGBA image as PNG.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// A decoded upload holding a solid-color PNG.
pub fn png_record(width: u32, height: u32, color: [u8; 4]) -> ImageRecord {
    decode("image/png", png_bytes(width, height, color).as_slice()).unwrap()
}
