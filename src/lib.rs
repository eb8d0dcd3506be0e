//! # Hug Reel
//!
//! Turns two portrait photos into a short video of one person hugging the
//! other. The photos are placed side by side in a single frame, that frame is
//! sent to a remote video model, and the finished clip is downloaded to a
//! local file.
//!
//! # Architecture: One Attempt, Three Steps
//!
//! ```text
//! 1. Decode      upload bytes  →  ImageRecord      (per slot, on upload)
//! 2. Composite   two records   →  CompositeFrame   (JPEG, canonical height)
//! 3. Generate    frame         →  VideoReference   (submit → poll → download)
//! ```
//!
//! [`workflow::WorkflowController`] runs steps 2 and 3 as one attempt and
//! publishes a single [`workflow::WorkflowState`] that views watch. The CLI
//! binary is one such view.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Upload decoding and the side-by-side compositor |
//! | [`generation`] | Remote video job: backend trait, HTTP backend, polling client |
//! | [`video`] | The downloaded clip as a temp file that can be saved elsewhere |
//! | [`workflow`] | State machine, progress ticker, upload slots |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting for inputs, composites, and workflow states |
//!
//! # Design Decisions
//!
//! ## Backends Behind Traits
//!
//! Image work goes through [`imaging::ImageBackend`] and remote calls through
//! [`generation::VideoBackend`]. The real implementations are pure Rust
//! (`image`) and plain HTTPS (`reqwest`); tests swap in recording mocks so the
//! compositor arithmetic and the polling loop run without pixels or network.
//!
//! ## Constant Poll Interval
//!
//! The client waits the same interval after every status report that isn't
//! done. There is no backoff and no overall timeout. Dropping the
//! [`workflow::WorkflowController::submit`] future abandons the attempt locally
//! and the state returns to `Idle`; the remote job is not cancelled.
//!
//! ## One State, Published
//!
//! The workflow state lives in a `tokio::sync::watch` channel. Transitions are
//! check-and-set on that channel, which is what makes a second submit during a
//! running attempt a clean rejection rather than a race.

pub mod config;
pub mod generation;
pub mod imaging;
pub mod output;
pub mod video;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_helpers;
