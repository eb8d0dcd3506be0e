//! Client-side view of one remote generation job.

/// Opaque reference to a job running on the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a single status query returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub done: bool,
    /// Where the finished video can be fetched from, if the service said.
    pub result_locator: Option<String>,
}

impl PollReport {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn done(result_locator: Option<String>) -> Self {
        Self {
            done: true,
            result_locator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Done,
}

/// Tracks a job from submission to completion.
///
/// Status only moves Pending → Done. Reports that arrive after completion
/// are ignored, so a finished job never regresses or loses its locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    handle: JobHandle,
    status: JobStatus,
    result_locator: Option<String>,
}

impl GenerationJob {
    pub fn new(handle: JobHandle) -> Self {
        Self {
            handle,
            status: JobStatus::Pending,
            result_locator: None,
        }
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.status == JobStatus::Done
    }

    pub fn result_locator(&self) -> Option<&str> {
        self.result_locator.as_deref()
    }

    /// Fold a poll report into the job.
    pub fn record(&mut self, report: PollReport) {
        if self.is_done() || !report.done {
            return;
        }
        self.status = JobStatus::Done;
        self.result_locator = report.result_locator.filter(|l| !l.trim().is_empty());
    }
}
