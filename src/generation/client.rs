//! Submit → poll → retrieve, on top of any [`VideoBackend`].

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use super::backend::{GenerationRequest, ServiceError, VideoBackend};
use super::job::GenerationJob;
use crate::imaging::CompositeFrame;
use crate::video::{DEFAULT_VIDEO_FILENAME, VideoReference};

/// Instruction sent with every composite frame.
pub const HUG_PROMPT: &str = "Two people stand side by side. The person on the right \
walks over to the person on the left, comes up from behind and wraps them in a warm, \
gentle hug. The person on the left stays still and does not move. Keep exactly two \
people in the scene: do not duplicate or add anyone.";

/// Constant wait between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Any failure of one generation attempt. All of them end the attempt.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Failed to start video generation: {0}")]
    Submit(ServiceError),
    #[error("Failed while checking on video generation: {0}")]
    Poll(ServiceError),
    #[error("Video generation finished, but no download link was provided.")]
    NoResultLocator,
    #[error("Failed to download the generated video: {0}")]
    DownloadFailure(ServiceError),
    #[error("Failed to store the generated video: {0}")]
    Materialize(#[from] std::io::Error),
}

/// Drives one remote job per [`generate`](Self::generate) call.
///
/// Never retries: the first failure at any step ends the attempt.
pub struct GenerationClient<V> {
    backend: V,
    poll_interval: Duration,
    video_filename: String,
}

impl<V: VideoBackend> GenerationClient<V> {
    pub fn new(backend: V) -> Self {
        Self {
            backend,
            poll_interval: DEFAULT_POLL_INTERVAL,
            video_filename: DEFAULT_VIDEO_FILENAME.to_string(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_video_filename(mut self, name: impl Into<String>) -> Self {
        self.video_filename = name.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn backend(&self) -> &V {
        &self.backend
    }

    /// Turn a composite frame into a local video.
    ///
    /// Polls until the job reports completion, waiting `poll_interval` after
    /// every report that isn't done. There is no overall timeout; dropping the
    /// future is the only way to stop early, and the remote job keeps running.
    pub async fn generate(
        &self,
        frame: &CompositeFrame,
    ) -> Result<VideoReference, GenerationError> {
        let record = frame.record();
        let request = GenerationRequest {
            image: record.bytes(),
            mime_type: record.mime_type(),
            prompt: HUG_PROMPT,
            sample_count: 1,
        };

        let handle = self
            .backend
            .submit(&request)
            .await
            .map_err(GenerationError::Submit)?;
        info!(
            job = %handle,
            width = frame.width(),
            height = frame.height(),
            "generation job submitted"
        );

        let mut job = GenerationJob::new(handle);
        let mut polls = 0u32;
        loop {
            let report = self
                .backend
                .poll_once(job.handle())
                .await
                .map_err(GenerationError::Poll)?;
            polls += 1;
            job.record(report);
            if job.is_done() {
                break;
            }
            debug!(job = %job.handle(), polls, "job still running");
            tokio::time::sleep(self.poll_interval).await;
        }
        info!(job = %job.handle(), polls, "generation job finished");

        let locator = job.result_locator().ok_or(GenerationError::NoResultLocator)?;
        let bytes = self
            .backend
            .download(locator)
            .await
            .map_err(GenerationError::DownloadFailure)?;
        info!(bytes = bytes.len(), "video downloaded");

        Ok(VideoReference::materialize(&bytes)?.with_suggested_filename(&self.video_filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::backend::tests::{MockVideoBackend, RecordedCall};
    use crate::generation::job::PollReport;
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::{CompositeConfig, Compositor, Dimensions};
    use crate::test_helpers::png_record;
    use tokio::time::Instant;

    fn frame() -> CompositeFrame {
        let backend = MockBackend::with_dimensions(vec![
            Dimensions {
                width: 100,
                height: 100,
            },
            Dimensions {
                width: 100,
                height: 100,
            },
        ]);
        let record = png_record(2, 2, [0, 0, 0, 255]);
        Compositor::with_backend(backend, CompositeConfig::default())
            .compose(&record, &record)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_completion_downloads_video() {
        let client = GenerationClient::new(MockVideoBackend::finishing_after(
            0,
            Some("https://x.test/v.mp4"),
            b"video",
        ));

        let start = Instant::now();
        let video = client.generate(&frame()).await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(std::fs::read(video.path()).unwrap(), b"video");
        assert_eq!(video.suggested_filename(), DEFAULT_VIDEO_FILENAME);

        let calls = client.backend().get_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            RecordedCall::Submit {
                mime_type: "image/jpeg".into(),
                image_len: b"mock-jpeg".len(),
                sample_count: 1,
            }
        );
        assert_eq!(calls[1], RecordedCall::Poll("operations/mock".into()));
        assert_eq!(
            calls[2],
            RecordedCall::Download("https://x.test/v.mp4".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn n_pending_polls_wait_n_intervals() {
        for pending in [1usize, 3, 6] {
            let client = GenerationClient::new(MockVideoBackend::finishing_after(
                pending,
                Some("loc"),
                b"v",
            ));
            let interval = client.poll_interval();

            let start = Instant::now();
            client.generate(&frame()).await.unwrap();
            let elapsed = start.elapsed();

            let expected = interval * pending as u32;
            assert!(
                elapsed >= expected && elapsed < expected + interval,
                "{pending} pending polls took {elapsed:?}"
            );
            assert_eq!(client.backend().poll_count(), pending + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval_is_constant() {
        let client = GenerationClient::new(MockVideoBackend::finishing_after(4, Some("loc"), b"v"))
            .with_poll_interval(Duration::from_secs(2));

        let start = Instant::now();
        client.generate(&frame()).await.unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_locator_fails_without_download() {
        let client = GenerationClient::new(MockVideoBackend::finishing_after(2, None, b"v"));

        let err = client.generate(&frame()).await.unwrap_err();

        assert!(matches!(err, GenerationError::NoResultLocator));
        assert!(err.to_string().contains("no download link was provided"));
        assert!(
            !client
                .backend()
                .get_calls()
                .iter()
                .any(|c| matches!(c, RecordedCall::Download(_)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn submit_failure_is_terminal() {
        let client = GenerationClient::new(MockVideoBackend::failing_submit(ServiceError::Api {
            status: 400,
            message: "bad image".into(),
        }));

        let err = client.generate(&frame()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Submit(_)));
        assert!(err.to_string().contains("bad image"));
        assert_eq!(client.backend().get_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_is_terminal() {
        let backend = MockVideoBackend::finishing_after(0, Some("loc"), b"v");
        backend.polls.lock().unwrap().push_front(Ok(PollReport::pending()));
        backend
            .polls
            .lock()
            .unwrap()
            .insert(1, Err(ServiceError::Operation("quota exceeded".into())));
        let client = GenerationClient::new(backend);

        let err = client.generate(&frame()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Poll(_)));
        assert!(err.to_string().contains("quota exceeded"));
        // No retry after the failed poll
        assert_eq!(client.backend().poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn download_failure_is_terminal() {
        let backend = MockVideoBackend::finishing_after(0, Some("loc"), b"v");
        *backend.download_result.lock().unwrap() = Some(Err(ServiceError::Api {
            status: 404,
            message: "not found".into(),
        }));
        let client = GenerationClient::new(backend);

        let err = client.generate(&frame()).await.unwrap_err();
        assert!(matches!(err, GenerationError::DownloadFailure(_)));
        assert!(err.to_string().starts_with("Failed to download the generated video"));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_filename_is_suggested() {
        let client = GenerationClient::new(MockVideoBackend::finishing_after(0, Some("loc"), b"v"))
            .with_video_filename("our_hug.mp4");

        let video = client.generate(&frame()).await.unwrap();
        assert_eq!(video.suggested_filename(), "our_hug.mp4");
    }
}
