//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend, Side};
use super::calculations::composite_layout;
use super::codec::ImageRecord;
use super::params::{ComposeParams, CompositeLayout, Quality};
use super::rust_backend::RustBackend;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// MIME type of every composite frame.
pub const COMPOSITE_MIME: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("Failed to combine the images: {0}")]
    Backend(#[from] BackendError),
}

/// Configuration for compositing.
#[derive(Debug, Clone, Copy)]
pub struct CompositeConfig {
    /// Height both images are scaled to before being placed side by side.
    pub canonical_height: u32,
    pub quality: Quality,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            canonical_height: 720,
            quality: Quality::default(),
        }
    }
}

/// The side-by-side frame handed to video generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeFrame {
    record: ImageRecord,
    layout: CompositeLayout,
}

impl CompositeFrame {
    pub fn record(&self) -> &ImageRecord {
        &self.record
    }

    pub fn width(&self) -> u32 {
        self.layout.width()
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    pub fn layout(&self) -> CompositeLayout {
        self.layout
    }

    /// Write the encoded frame to disk.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.record.bytes())
    }
}

/// Plan a compose without executing it.
///
/// Aspect ratios are read fresh from each payload on every call.
pub fn plan_composite<'a>(
    backend: &impl ImageBackend,
    left: &'a ImageRecord,
    right: &'a ImageRecord,
    config: &CompositeConfig,
) -> Result<ComposeParams<'a>, BackendError> {
    let l = backend.identify(Side::Left, left.bytes())?;
    let r = backend.identify(Side::Right, right.bytes())?;
    let layout = composite_layout(
        (l.width, l.height),
        (r.width, r.height),
        config.canonical_height,
    );

    Ok(ComposeParams {
        left: left.bytes(),
        right: right.bytes(),
        layout,
        quality: config.quality,
    })
}

/// Builds composite frames from two uploaded images.
pub struct Compositor<B = RustBackend> {
    backend: B,
    config: CompositeConfig,
}

impl Compositor<RustBackend> {
    pub fn new(config: CompositeConfig) -> Self {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl<B: ImageBackend> Compositor<B> {
    /// Use a specific backend (allows testing with mock).
    pub fn with_backend(backend: B, config: CompositeConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Scale both images to the canonical height and place them side by side.
    pub fn compose(
        &self,
        left: &ImageRecord,
        right: &ImageRecord,
    ) -> Result<CompositeFrame, CompositionError> {
        let params = plan_composite(&self.backend, left, right, &self.config)?;
        debug!(
            left_width = params.layout.left_width,
            right_width = params.layout.right_width,
            height = params.layout.height,
            "composing frame"
        );
        let bytes = self.backend.compose(&params)?;

        Ok(CompositeFrame {
            record: ImageRecord::from_parts(bytes, COMPOSITE_MIME),
            layout: params.layout,
        })
    }
}
