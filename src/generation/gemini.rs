//! HTTP backend for a long-running-operation video API (Gemini `predictLongRunning`).
//!
//! No polling policy here. Each method is exactly one request.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Response};

use super::backend::{GenerationRequest, ServiceError, VideoBackend};
use super::job::{JobHandle, PollReport};
use super::types::{ErrorEnvelope, InlineImage, Instance, Operation, Parameters, PredictRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "veo-2.0-generate-001";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Raw HTTP client for the video generation API.
///
/// The credential is supplied by the caller; nothing here reads the environment.
pub struct GeminiBackend {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Create a backend against the public endpoint with the default model.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.into(), DEFAULT_MODEL.into())
    }

    /// Create a backend with a custom base URL and model (for testing with mock servers).
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn submit_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.base_url, self.model
        )
    }

    fn operation_url(&self, handle: &JobHandle) -> String {
        format!("{}/v1beta/{}", self.base_url, handle.as_str())
    }

    fn build_request(request: &GenerationRequest<'_>) -> PredictRequest {
        PredictRequest {
            instances: vec![Instance {
                prompt: request.prompt.to_string(),
                image: InlineImage {
                    bytes_base64_encoded: STANDARD.encode(request.image),
                    mime_type: request.mime_type.to_string(),
                },
            }],
            parameters: Parameters {
                sample_count: request.sample_count,
            },
        }
    }
}

/// Turn an HTTP failure status into [`ServiceError::Api`], keeping the
/// service's own message when the body carries one.
async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(ServiceError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn parse_operation(response: Response) -> Result<Operation, ServiceError> {
    check_status(response)
        .await?
        .json::<Operation>()
        .await
        .map_err(|e| ServiceError::InvalidResponse(format!("failed to parse operation: {e}")))
}

/// The job handle from a submit response.
fn handle_from(operation: Operation) -> Result<JobHandle, ServiceError> {
    if operation.name.trim().is_empty() {
        return Err(ServiceError::InvalidResponse("operation has no name".into()));
    }
    Ok(JobHandle::new(operation.name))
}

/// Body of a download response. An empty body counts as a failure.
async fn read_video(response: Response) -> Result<Vec<u8>, ServiceError> {
    let bytes = check_status(response).await?.bytes().await?;
    if bytes.is_empty() {
        return Err(ServiceError::InvalidResponse("downloaded video is empty".into()));
    }
    Ok(bytes.to_vec())
}

/// Interpret an operation returned by a status query.
fn report_from(operation: Operation) -> Result<PollReport, ServiceError> {
    if let Some(error) = &operation.error {
        return Err(ServiceError::Operation(format!(
            "{} (code {})",
            error.message, error.code
        )));
    }
    if !operation.done {
        return Ok(PollReport::pending());
    }
    Ok(PollReport::done(operation.video_uri().map(str::to_string)))
}

#[async_trait]
impl VideoBackend for GeminiBackend {
    async fn submit(&self, request: &GenerationRequest<'_>) -> Result<JobHandle, ServiceError> {
        let response = self
            .http
            .post(self.submit_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::build_request(request))
            .send()
            .await?;

        handle_from(parse_operation(response).await?)
    }

    async fn poll_once(&self, handle: &JobHandle) -> Result<PollReport, ServiceError> {
        let response = self
            .http
            .get(self.operation_url(handle))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        report_from(parse_operation(response).await?)
    }

    async fn download(&self, locator: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .http
            .get(locator)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        read_video(response).await
    }
}
