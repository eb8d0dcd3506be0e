//! Pure calculation functions for composite dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CompositeLayout;

/// Largest canvas edge we will try to allocate, in pixels.
pub const MAX_CANVAS_EDGE: u32 = 32_767;

/// Largest canvas area we will try to allocate, in pixels.
pub const MAX_CANVAS_AREA: u64 = 268_435_456;

/// Width of an image once scaled to `target_height`, preserving aspect ratio.
///
/// Never returns less than one pixel, so a very tall sliver still gets drawn.
///
/// # Examples
/// ```
/// # use hug_reel::imaging::scaled_width;
/// // 4:3 at 720 high → 960 wide
/// assert_eq!(scaled_width((800, 600), 720), 960);
///
/// // Square stays square
/// assert_eq!(scaled_width((100, 100), 720), 720);
/// ```
pub fn scaled_width(source: (u32, u32), target_height: u32) -> u32 {
    let (src_w, src_h) = source;
    let w = (target_height as f64 * src_w as f64 / src_h as f64).round();
    (w as u32).max(1)
}

/// Lay two images side by side at a shared height.
///
/// The left image starts at x = 0 and the right one starts exactly where the
/// left one ends: no gap, no overlap.
pub fn composite_layout(left: (u32, u32), right: (u32, u32), height: u32) -> CompositeLayout {
    let left_width = scaled_width(left, height);
    let right_width = scaled_width(right, height);
    CompositeLayout {
        left_width,
        right_width,
        height,
    }
}

/// Whether a canvas of this size can be allocated at all.
pub fn fits_canvas(width: u32, height: u32) -> bool {
    width > 0
        && height > 0
        && width <= MAX_CANVAS_EDGE
        && height <= MAX_CANVAS_EDGE
        && (width as u64) * (height as u64) <= MAX_CANVAS_AREA
}
