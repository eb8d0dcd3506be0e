//! Video generation: one composite frame in, one local video out.
//!
//! - [`backend`]: the [`VideoBackend`] capability trait (submit, poll once, download)
//! - [`gemini`]: HTTP implementation of that trait
//! - [`job`]: monotonic client-side job status
//! - [`client`]: [`GenerationClient`], the submit → poll → retrieve loop

pub mod backend;
pub mod client;
pub mod gemini;
pub mod job;
pub mod types;

pub use backend::{GenerationRequest, ServiceError, VideoBackend};
pub use client::{DEFAULT_POLL_INTERVAL, GenerationClient, GenerationError, HUG_PROMPT};
pub use gemini::GeminiBackend;
pub use job::{GenerationJob, JobHandle, JobStatus, PollReport};
