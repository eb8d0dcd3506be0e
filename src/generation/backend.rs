//! Capability interface for the remote video-generation service.
//!
//! [`VideoBackend`] is the only thing [`GenerationClient`](super::GenerationClient)
//! knows about the provider: start a job, ask about it once, fetch bytes from a
//! locator. The polling policy lives in the client, so it stays
//! provider-agnostic and can be driven by [`tests::MockVideoBackend`].
//!
//! The production implementation is [`GeminiBackend`](super::gemini::GeminiBackend).

use super::job::{JobHandle, PollReport};
use async_trait::async_trait;

/// Errors from a single call to the generation service.
///
/// Service-reported failures and transport failures share this type; they
/// differ only in how they read.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("service reported an error: {0}")]
    Operation(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Everything the service needs to start one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    pub image: &'a [u8],
    pub mime_type: &'a str,
    pub prompt: &'a str,
    /// Number of videos to generate.
    pub sample_count: u32,
}

#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Start a job and return its handle.
    async fn submit(&self, request: &GenerationRequest<'_>) -> Result<JobHandle, ServiceError>;

    /// Query a job's status once.
    async fn poll_once(&self, handle: &JobHandle) -> Result<PollReport, ServiceError>;

    /// Fetch the bytes behind a result locator.
    async fn download(&self, locator: &str) -> Result<Vec<u8>, ServiceError>;
}
