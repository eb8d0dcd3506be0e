//! The state machine the view layer watches.
//!
//! ```text
//!            submit (both slots filled)
//!   Idle ───────────────────────────────▶ Compositing
//!    ▲  ▲                                    │      │
//!    │  │ dismiss                     frame  │      │ error
//!    │  │                                    ▼      ▼
//!    │  └──────────────────────────── Failed ◀── Generating(message)
//!    │ reset                                        │
//!    └─────────────────────────────── Ready(video) ◀┘
//! ```
//!
//! [`WorkflowController`] owns the single [`WorkflowState`] value and
//! publishes it over a `tokio::sync::watch` channel. Views call
//! [`WorkflowController::subscribe`] and only ever read.
//!
//! Upload errors stay on their slot; they never move the state machine.
//! A submit while an attempt is running is rejected, as is a submit with an
//! empty slot. Neither changes the state.

pub mod ticker;

use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::generation::{GenerationClient, VideoBackend};
use crate::imaging::{Compositor, DecodeError, ImageBackend, ImageRecord, decode, decode_file};
use crate::video::VideoReference;
use ticker::{DEFAULT_TICK_PERIOD, PROGRESS_MESSAGES, ProgressTicker};

/// What the view shows. Exactly one is active at a time.
#[derive(Debug, Clone, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Compositing,
    Generating(String),
    Ready(VideoReference),
    Failed(String),
}

impl WorkflowState {
    /// An attempt is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Compositing | Self::Generating(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Compositing => "compositing",
            Self::Generating(_) => "generating",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

/// The two upload slots. The still subject goes on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRole {
    /// Left image: the person who stays still.
    Still,
    /// Right image: the person who moves in for the hug.
    Hugger,
}

impl SlotRole {
    pub const ALL: [SlotRole; 2] = [SlotRole::Still, SlotRole::Hugger];

    pub fn label(self) -> &'static str {
        match self {
            SlotRole::Still => "Person who stays still",
            SlotRole::Hugger => "Person who moves to hug",
        }
    }
}

/// One upload slot: either a usable image or (optionally) why there isn't one.
#[derive(Debug, Clone, Default)]
pub struct Slot {
    pub input: Option<ImageRecord>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Slots {
    still: Slot,
    hugger: Slot,
}

impl Slots {
    fn get(&self, role: SlotRole) -> &Slot {
        match role {
            SlotRole::Still => &self.still,
            SlotRole::Hugger => &self.hugger,
        }
    }

    fn get_mut(&mut self, role: SlotRole) -> &mut Slot {
        match role {
            SlotRole::Still => &mut self.still,
            SlotRole::Hugger => &mut self.hugger,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Please upload both images before generating (missing: {})", missing_labels(.missing))]
    MissingInput { missing: Vec<SlotRole> },
    #[error("A video is already being generated.")]
    Busy,
}

fn missing_labels(missing: &[SlotRole]) -> String {
    missing
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Puts the state back to `Idle` if an attempt is abandoned mid-flight.
struct AttemptGuard<'a> {
    state: &'a watch::Sender<WorkflowState>,
    finished: bool,
}

impl AttemptGuard<'_> {
    fn finish(mut self, terminal: WorkflowState) -> WorkflowState {
        self.finished = true;
        self.state.send_replace(terminal.clone());
        terminal
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("generation attempt abandoned; remote job may still be running");
            self.state.send_replace(WorkflowState::Idle);
        }
    }
}

/// Orchestrates compositing and generation for one pair of uploads.
pub struct WorkflowController<B, V> {
    compositor: Compositor<B>,
    client: GenerationClient<V>,
    tick_period: Duration,
    slots: Mutex<Slots>,
    state: Arc<watch::Sender<WorkflowState>>,
}

impl<B: ImageBackend, V: VideoBackend> WorkflowController<B, V> {
    pub fn new(compositor: Compositor<B>, client: GenerationClient<V>) -> Self {
        Self {
            compositor,
            client,
            tick_period: DEFAULT_TICK_PERIOD,
            slots: Mutex::new(Slots::default()),
            state: Arc::new(watch::Sender::new(WorkflowState::Idle)),
        }
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn compositor(&self) -> &Compositor<B> {
        &self.compositor
    }

    pub fn client(&self) -> &GenerationClient<V> {
        &self.client
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of one upload slot.
    pub fn slot(&self, role: SlotRole) -> Slot {
        self.slots().get(role).clone()
    }

    fn store(
        &self,
        role: SlotRole,
        decoded: Result<ImageRecord, DecodeError>,
    ) -> Result<(), DecodeError> {
        let mut slots = self.slots();
        let slot = slots.get_mut(role);
        match decoded {
            Ok(record) => {
                slot.input = Some(record);
                slot.error = None;
                Ok(())
            }
            Err(e) => {
                slot.input = None;
                slot.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fill a slot from an upload. On failure the slot is left empty with a
    /// local error message; the workflow state is untouched.
    pub fn upload(
        &self,
        role: SlotRole,
        mime_type: &str,
        reader: impl Read,
    ) -> Result<(), DecodeError> {
        self.store(role, decode(mime_type, reader))
    }

    /// Fill a slot from a file on disk.
    pub fn upload_file(&self, role: SlotRole, path: &Path) -> Result<(), DecodeError> {
        self.store(role, decode_file(path))
    }

    /// Empty a slot and clear its error.
    pub fn clear(&self, role: SlotRole) {
        *self.slots().get_mut(role) = Slot::default();
    }

    /// Leave `Failed` for `Idle`, keeping both uploads. No-op in any other state.
    pub fn dismiss(&self) -> bool {
        self.state.send_if_modified(|state| {
            if matches!(state, WorkflowState::Failed(_)) {
                *state = WorkflowState::Idle;
                true
            } else {
                false
            }
        })
    }

    /// Return to `Idle` with both slots emptied.
    pub fn reset(&self) -> Result<(), WorkflowError> {
        // Slots stay locked across the transition so a submit can't pick up
        // inputs that are about to be cleared.
        let mut slots = self.slots();
        let mut rejected = false;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                rejected = true;
                return false;
            }
            let changed = !matches!(state, WorkflowState::Idle);
            *state = WorkflowState::Idle;
            changed
        });
        if rejected {
            return Err(WorkflowError::Busy);
        }
        *slots = Slots::default();
        Ok(())
    }

    /// Run one attempt: composite, generate, and land in `Ready` or `Failed`.
    ///
    /// Returns the terminal state. Rejected without any state change if an
    /// attempt is already running or a slot is empty.
    pub async fn submit(&self) -> Result<WorkflowState, WorkflowError> {
        if self.state.borrow().is_busy() {
            return Err(WorkflowError::Busy);
        }
        let (left, right) = {
            let slots = self.slots();
            let (left, right) = match (&slots.still.input, &slots.hugger.input) {
                (Some(l), Some(r)) => (l.clone(), r.clone()),
                (l, r) => {
                    let missing = [
                        (SlotRole::Still, l.is_none()),
                        (SlotRole::Hugger, r.is_none()),
                    ]
                    .into_iter()
                    .filter_map(|(role, absent)| absent.then_some(role))
                    .collect();
                    return Err(WorkflowError::MissingInput { missing });
                }
            };

            // Claimed while the slots are still locked, see `reset`
            let mut accepted = false;
            self.state.send_if_modified(|state| {
                if state.is_busy() {
                    return false;
                }
                *state = WorkflowState::Compositing;
                accepted = true;
                true
            });
            if !accepted {
                return Err(WorkflowError::Busy);
            }
            (left, right)
        };
        let attempt = AttemptGuard {
            state: self.state.as_ref(),
            finished: false,
        };
        info!("compositing");

        let frame = match self.compositor.compose(&left, &right) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "compositing failed");
                return Ok(attempt.finish(WorkflowState::Failed(e.to_string())));
            }
        };

        info!(width = frame.width(), height = frame.height(), "generating");
        self.state
            .send_replace(WorkflowState::Generating(PROGRESS_MESSAGES[0].to_string()));
        let ticker_state = Arc::clone(&self.state);
        let ticker = ProgressTicker::start(PROGRESS_MESSAGES, self.tick_period, move |message| {
            ticker_state.send_if_modified(|state| match state {
                WorkflowState::Generating(current) => {
                    *current = message.to_string();
                    true
                }
                _ => false,
            });
        });

        let result = self.client.generate(&frame).await;
        ticker.stop();

        let terminal = match result {
            Ok(video) => {
                info!(path = %video.path().display(), "video ready");
                WorkflowState::Ready(video)
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                WorkflowState::Failed(e.to_string())
            }
        };
        Ok(attempt.finish(terminal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::backend::tests::{MockVideoBackend, RecordedCall};
    use crate::generation::{PollReport, ServiceError};
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::{CompositeConfig, Dimensions};
    use crate::test_helpers::png_bytes;
    use tokio::time::Instant;

    type TestController = WorkflowController<MockBackend, MockVideoBackend>;

    fn square() -> Dimensions {
        Dimensions {
            width: 100,
            height: 100,
        }
    }

    fn controller(video: MockVideoBackend) -> TestController {
        let images = MockBackend::with_dimensions(vec![square(), square()]);
        WorkflowController::new(
            Compositor::with_backend(images, CompositeConfig::default()),
            GenerationClient::new(video),
        )
    }

    fn fill_both(c: &TestController) {
        let png = png_bytes(4, 4, [0, 0, 0, 255]);
        c.upload(SlotRole::Still, "image/png", &png[..]).unwrap();
        c.upload(SlotRole::Hugger, "image/png", &png[..]).unwrap();
    }

    #[test]
    fn starts_idle_with_empty_slots() {
        let c = controller(MockVideoBackend::new());
        assert!(matches!(c.state(), WorkflowState::Idle));
        for role in SlotRole::ALL {
            assert!(c.slot(role).input.is_none());
            assert!(c.slot(role).error.is_none());
        }
    }

    #[test]
    fn bad_upload_sets_slot_error_only() {
        let c = controller(MockVideoBackend::new());
        let err = c
            .upload(SlotRole::Hugger, "text/plain", &b"hello"[..])
            .unwrap_err();

        assert!(matches!(err, DecodeError::UnsupportedFormat { .. }));
        let slot = c.slot(SlotRole::Hugger);
        assert!(slot.input.is_none());
        assert!(
            slot.error
                .unwrap()
                .starts_with("Please upload a valid image file")
        );
        assert!(matches!(c.state(), WorkflowState::Idle));
    }

    #[test]
    fn bad_upload_replaces_previous_input() {
        let c = controller(MockVideoBackend::new());
        fill_both(&c);
        let _ = c.upload(SlotRole::Still, "application/zip", &b"PK"[..]);

        assert!(c.slot(SlotRole::Still).input.is_none());
        assert!(c.slot(SlotRole::Hugger).input.is_some());
    }

    #[test]
    fn good_upload_clears_slot_error() {
        let c = controller(MockVideoBackend::new());
        let _ = c.upload(SlotRole::Still, "text/plain", &b"x"[..]);
        let png = png_bytes(2, 2, [0, 0, 0, 255]);
        c.upload(SlotRole::Still, "image/png", &png[..]).unwrap();

        let slot = c.slot(SlotRole::Still);
        assert!(slot.input.is_some());
        assert!(slot.error.is_none());
    }

    #[test]
    fn clear_empties_slot() {
        let c = controller(MockVideoBackend::new());
        fill_both(&c);
        c.clear(SlotRole::Still);
        assert!(c.slot(SlotRole::Still).input.is_none());
        assert!(c.slot(SlotRole::Hugger).input.is_some());
    }

    #[tokio::test]
    async fn submit_without_inputs_touches_nothing() {
        let c = controller(MockVideoBackend::new());
        let rx = c.subscribe();

        let err = c.submit().await.unwrap_err();

        assert_eq!(
            err,
            WorkflowError::MissingInput {
                missing: vec![SlotRole::Still, SlotRole::Hugger]
            }
        );
        assert!(matches!(c.state(), WorkflowState::Idle));
        assert!(!rx.has_changed().unwrap());
        assert!(c.compositor().backend().get_operations().is_empty());
        assert!(c.client().backend().get_calls().is_empty());
    }

    #[tokio::test]
    async fn submit_with_one_input_reports_the_other() {
        let c = controller(MockVideoBackend::new());
        let png = png_bytes(2, 2, [0, 0, 0, 255]);
        c.upload(SlotRole::Still, "image/png", &png[..]).unwrap();

        let err = c.submit().await.unwrap_err();
        assert_eq!(
            err,
            WorkflowError::MissingInput {
                missing: vec![SlotRole::Hugger]
            }
        );
        assert!(err.to_string().contains("Person who moves to hug"));
        assert!(c.compositor().backend().get_operations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_attempt_ends_ready() {
        let c = controller(MockVideoBackend::finishing_after(0, Some("loc"), b"mp4"));
        fill_both(&c);

        let terminal = c.submit().await.unwrap();

        let WorkflowState::Ready(video) = terminal else {
            panic!("expected Ready, got {terminal:?}");
        };
        assert_eq!(std::fs::read(video.path()).unwrap(), b"mp4");
        assert!(matches!(c.state(), WorkflowState::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn composition_failure_skips_generation() {
        let images = MockBackend::new(); // identify fails
        let c = WorkflowController::new(
            Compositor::with_backend(images, CompositeConfig::default()),
            GenerationClient::new(MockVideoBackend::new()),
        );
        fill_both(&c);

        let terminal = c.submit().await.unwrap();

        assert!(matches!(terminal, WorkflowState::Failed(ref m) if m.contains("combine")));
        assert!(c.client().backend().get_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn generation_failure_ends_failed() {
        let c = controller(MockVideoBackend::failing_submit(ServiceError::Operation(
            "safety filter".into(),
        )));
        fill_both(&c);

        let terminal = c.submit().await.unwrap();
        assert!(matches!(terminal, WorkflowState::Failed(ref m) if m.contains("safety filter")));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_message_rotates_while_generating() {
        let c = Arc::new(controller(MockVideoBackend::finishing_after(
            2,
            Some("loc"),
            b"v",
        )));
        fill_both(&c);
        let mut rx = c.subscribe();

        let runner = Arc::clone(&c);
        let attempt = tokio::spawn(async move { runner.submit().await });

        let mut messages = Vec::new();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            match state {
                WorkflowState::Generating(m) => messages.push(m),
                WorkflowState::Ready(_) => break,
                WorkflowState::Failed(m) => panic!("unexpected failure: {m}"),
                _ => {}
            }
        }
        attempt.await.unwrap().unwrap();

        // 20s of polling at a 3s period: first message plus six ticks
        assert_eq!(
            messages.first().map(String::as_str),
            Some(PROGRESS_MESSAGES[0])
        );
        assert_eq!(messages.len(), 7);
        for pair in messages.windows(2) {
            let a = PROGRESS_MESSAGES.iter().position(|m| *m == pair[0]).unwrap();
            let b = PROGRESS_MESSAGES.iter().position(|m| *m == pair[1]).unwrap();
            assert_eq!(b, ticker::next_index(a, PROGRESS_MESSAGES.len()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_leaving_generating() {
        let c = controller(MockVideoBackend::finishing_after(1, Some("loc"), b"v"));
        fill_both(&c);
        c.submit().await.unwrap();
        let rx = c.subscribe();

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(!rx.has_changed().unwrap());
        assert!(matches!(c.state(), WorkflowState::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_rejected_while_busy() {
        let c = Arc::new(controller(MockVideoBackend::finishing_after(
            3,
            Some("loc"),
            b"v",
        )));
        fill_both(&c);

        let runner = Arc::clone(&c);
        let attempt = tokio::spawn(async move { runner.submit().await });
        let mut rx = c.subscribe();
        rx.wait_for(|s| matches!(s, WorkflowState::Generating(_)))
            .await
            .unwrap();

        assert_eq!(c.submit().await.unwrap_err(), WorkflowError::Busy);
        assert_eq!(c.reset().unwrap_err(), WorkflowError::Busy);

        assert!(matches!(
            attempt.await.unwrap().unwrap(),
            WorkflowState::Ready(_)
        ));
        let submits = c
            .client()
            .backend()
            .get_calls()
            .into_iter()
            .filter(|call| matches!(call, RecordedCall::Submit { .. }))
            .count();
        assert_eq!(submits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_keeps_inputs() {
        let c = controller(MockVideoBackend::finishing_after(0, None, b""));
        fill_both(&c);

        assert!(matches!(
            c.submit().await.unwrap(),
            WorkflowState::Failed(_)
        ));
        assert!(c.dismiss());

        assert!(matches!(c.state(), WorkflowState::Idle));
        assert!(c.slot(SlotRole::Still).input.is_some());
        assert!(c.slot(SlotRole::Hugger).input.is_some());
    }

    #[test]
    fn dismiss_outside_failed_is_noop() {
        let c = controller(MockVideoBackend::new());
        assert!(!c.dismiss());
        assert!(matches!(c.state(), WorkflowState::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_from_ready_clears_inputs() {
        let c = controller(MockVideoBackend::finishing_after(0, Some("loc"), b"v"));
        fill_both(&c);
        c.submit().await.unwrap();

        c.reset().unwrap();

        assert!(matches!(c.state(), WorkflowState::Idle));
        assert!(c.slot(SlotRole::Still).input.is_none());
        assert!(c.slot(SlotRole::Hugger).input.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_dismiss_runs_a_new_attempt() {
        let video = MockVideoBackend::finishing_after(0, None, b"");
        // Second attempt: done with a locator, then download succeeds
        video
            .polls
            .lock()
            .unwrap()
            .push_back(Ok(PollReport::done(Some("loc".into()))));
        *video.download_result.lock().unwrap() = Some(Ok(b"v".to_vec()));
        let images = MockBackend::with_dimensions(vec![square(), square(), square(), square()]);
        let c = WorkflowController::new(
            Compositor::with_backend(images, CompositeConfig::default()),
            GenerationClient::new(video),
        );
        fill_both(&c);

        assert!(matches!(
            c.submit().await.unwrap(),
            WorkflowState::Failed(_)
        ));
        c.dismiss();
        assert!(matches!(c.submit().await.unwrap(), WorkflowState::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_attempt_returns_to_idle() {
        // No scripted polls: the job reports pending forever
        let c = controller(MockVideoBackend::new());
        fill_both(&c);

        let start = Instant::now();
        let outcome = tokio::time::timeout(Duration::from_secs(45), c.submit()).await;
        assert!(outcome.is_err(), "attempt should still be running");
        assert!(start.elapsed() >= Duration::from_secs(45));

        assert!(matches!(c.state(), WorkflowState::Idle));
        let polls = c.client().backend().poll_count();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(c.client().backend().poll_count(), polls);
    }

    #[tokio::test]
    async fn reset_racing_submit_never_loses_to_a_stale_attempt() {
        for _ in 0..200 {
            let c = Arc::new(controller(MockVideoBackend::finishing_after(
                0,
                Some("loc"),
                b"v",
            )));
            fill_both(&c);

            let resetter = {
                let c = Arc::clone(&c);
                std::thread::spawn(move || c.reset())
            };
            let submitted = c.submit().await;
            let reset = resetter.join().unwrap();

            // Both succeeding means the reset ran after the attempt finished
            if let (Ok(_), Ok(())) = (&submitted, &reset) {
                assert!(matches!(c.state(), WorkflowState::Idle));
            }
            if reset.is_ok() {
                assert!(c.slot(SlotRole::Still).input.is_none());
                assert!(c.slot(SlotRole::Hugger).input.is_none());
            }
        }
    }
}
