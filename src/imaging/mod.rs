//! Image handling in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode upload** | declared MIME type check + full read |
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Composite** | Lanczos3 resize + `imageops::overlay` |
//! | **Encode** | `JpegEncoder` at fixed quality |
//!
//! The module is split into:
//! - **Codec**: [`decode`] turns an upload into an [`ImageRecord`]
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`Compositor`], combining calculations + backend

pub mod backend;
mod calculations;
pub mod codec;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, Side};
pub use calculations::{composite_layout, scaled_width};
pub use codec::{DecodeError, ImageRecord, decode, decode_file};
pub use operations::{CompositeConfig, CompositeFrame, CompositionError, Compositor};
pub use params::{ComposeParams, CompositeLayout, Quality};
pub use rust_backend::RustBackend;
