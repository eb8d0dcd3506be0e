//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and compose.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on top of the
//! `image` crate. Everything is statically linked into the binary.

use super::params::ComposeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode {side} image: {message}")]
    Decode { side: Side, message: String },
    #[error("Could not allocate a {width}x{height} drawing surface")]
    Surface { width: u32, height: u32 },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Which half of the composite an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Backends work on encoded payloads in memory; nothing touches disk.
pub trait ImageBackend: Send + Sync {
    /// Get pixel dimensions of an encoded image.
    fn identify(&self, side: Side, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Draw both images onto one canvas and encode it.
    fn compose(&self, params: &ComposeParams) -> Result<Vec<u8>, BackendError>;
}
