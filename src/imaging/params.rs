//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides how the composite is laid out) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CompositeLayout`]: Scaled widths of both halves and the shared height.
//! - [`ComposeParams`]: Full specification for a compose: both source payloads, layout, quality.

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

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Where each half of the composite lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayout {
    /// Width of the left image after scaling to `height`.
    pub left_width: u32,
    /// Width of the right image after scaling to `height`.
    pub right_width: u32,
    /// Canonical height shared by both halves and the canvas.
    pub height: u32,
}

impl CompositeLayout {
    /// Total canvas width.
    pub fn width(&self) -> u32 {
        self.left_width + self.right_width
    }

    /// X coordinate where the right image starts.
    pub fn right_offset(&self) -> u32 {
        self.left_width
    }
}

/// Parameters for a compose operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeParams<'a> {
    /// Encoded payload of the left (stationary) image.
    pub left: &'a [u8],
    /// Encoded payload of the right (moving) image.
    pub right: &'a [u8],
    pub layout: CompositeLayout,
    pub quality: Quality,
}
