//! CLI output formatting for the hug workflow.
//!
//! The CLI is a thin view: it watches [`WorkflowState`] and prints one block
//! per state it sees. Nothing here decides anything.
//!
//! # Output Format
//!
//! ## Inputs
//!
//! ```text
//! Inputs
//!     Person who stays still: image/png (48213 bytes)
//!     Person who moves to hug: Please upload a valid image file (PNG, JPEG, WEBP or TIFF).
//! ```
//!
//! ## Composite
//!
//! ```text
//! Composite 1440x720
//!     Left:  720px
//!     Right: 720px
//!     Saved: composite.jpg
//! ```
//!
//! ## Workflow
//!
//! ```text
//! ==> Compositing images
//! ==> Warming up the hug machine...
//! ==> Studying both portraits...
//! ==> Video ready (2841733 bytes)
//!     File: /tmp/hug-reel-a1b2c3.mp4
//!     Saved: ai_hug_video.mp4
//! ```
//!
//! # Architecture
//!
//! Each block has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::imaging::CompositeFrame;
use crate::workflow::{Slot, SlotRole, WorkflowState};
use std::path::Path;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// One line per upload slot: the accepted image, its error, or `empty`.
pub fn format_slot(role: SlotRole, slot: &Slot) -> String {
    let detail = match (&slot.input, &slot.error) {
        (Some(record), _) => format!("{} ({} bytes)", record.mime_type(), record.len()),
        (None, Some(error)) => error.clone(),
        (None, None) => "empty".to_string(),
    };
    format!("{}{}: {}", indent(1), role.label(), detail)
}

pub fn format_inputs(slots: &[(SlotRole, Slot)]) -> Vec<String> {
    let mut lines = vec!["Inputs".to_string()];
    lines.extend(slots.iter().map(|(role, slot)| format_slot(*role, slot)));
    lines
}

/// Summary of a composite frame, with where it was written if it was.
pub fn format_composite(frame: &CompositeFrame, saved: Option<&Path>) -> Vec<String> {
    let layout = frame.layout();
    let mut lines = vec![
        format!("Composite {}x{}", frame.width(), frame.height()),
        format!("{}Left:  {}px", indent(1), layout.left_width),
        format!("{}Right: {}px", indent(1), layout.right_width),
    ];
    if let Some(path) = saved {
        lines.push(format!("{}Saved: {}", indent(1), path.display()));
    }
    lines
}

/// One block per observed workflow state.
pub fn format_state(state: &WorkflowState) -> Vec<String> {
    match state {
        WorkflowState::Idle => vec!["==> Idle".to_string()],
        WorkflowState::Compositing => vec!["==> Compositing images".to_string()],
        WorkflowState::Generating(message) => vec![format!("==> {message}")],
        WorkflowState::Ready(video) => vec![
            format!("==> Video ready ({} bytes)", video.len()),
            format!("{}File: {}", indent(1), video.path().display()),
        ],
        WorkflowState::Failed(message) => vec![format!("==> Failed: {message}")],
    }
}

pub fn format_saved(path: &Path) -> String {
    format!("{}Saved: {}", indent(1), path.display())
}

pub fn print_inputs(slots: &[(SlotRole, Slot)]) {
    for line in format_inputs(slots) {
        println!("{}", line);
    }
}

pub fn print_composite(frame: &CompositeFrame, saved: Option<&Path>) {
    for line in format_composite(frame, saved) {
        println!("{}", line);
    }
}

pub fn print_state(state: &WorkflowState) {
    for line in format_state(state) {
        println!("{}", line);
    }
}
