//! Upload decoding: raw bytes + declared MIME type → [`ImageRecord`].
//!
//! The codec only trusts the *declared* type. Whether the bytes really decode
//! to pixels is the compositor's problem (it fails with a composition error
//! if they don't). Nothing here touches the network or any shared state.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// MIME type declared for files whose extension we don't recognize.
const UNKNOWN_MIME: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Please upload a valid image file (PNG, JPEG, WEBP or TIFF).")]
    UnsupportedFormat { declared: String },
    #[error("Failed to read the image file: {0}")]
    ReadFailure(#[from] std::io::Error),
}

/// An uploaded image: payload bytes plus the MIME type they were declared with.
///
/// Immutable once built. Cloning is cheap; the payload is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl ImageRecord {
    pub(crate) fn from_parts(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A `data:` URL a viewer can render directly.
    ///
    /// Derived from the payload on every call, so it can never drift from it.
    pub fn preview_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

fn declares_image(mime_type: &str) -> bool {
    mime_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Decode an upload from a reader and its declared MIME type.
pub fn decode(mime_type: &str, mut reader: impl Read) -> Result<ImageRecord, DecodeError> {
    if !declares_image(mime_type) {
        return Err(DecodeError::UnsupportedFormat {
            declared: mime_type.to_string(),
        });
    }

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        return Err(DecodeError::ReadFailure(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "file is empty",
        )));
    }

    Ok(ImageRecord::from_parts(
        bytes,
        mime_type.trim().to_ascii_lowercase(),
    ))
}

/// MIME type implied by a file's extension.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(UNKNOWN_MIME)
}

/// Decode a file from disk, declaring its type from the extension.
pub fn decode_file(path: &Path) -> Result<ImageRecord, DecodeError> {
    let mime_type = mime_type_for_path(path);
    if !declares_image(mime_type) {
        return Err(DecodeError::UnsupportedFormat {
            declared: mime_type.to_string(),
        });
    }
    let file = std::fs::File::open(path)?;
    decode(mime_type, std::io::BufReader::new(file))
}
