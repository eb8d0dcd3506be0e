//! Rotating "still working" messages shown while a video is generated.
//!
//! The messages say nothing about real progress; they only show the user
//! that the app is alive. A [`ProgressTicker`] is a spawned task that advances
//! through [`PROGRESS_MESSAGES`] on a fixed period and wraps around. It stops
//! when [`ProgressTicker::stop`] is called or when it is dropped, whichever
//! comes first.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Messages in display order. The first one is shown on entry.
pub const PROGRESS_MESSAGES: &[&str] = &[
    "Warming up the hug machine...",
    "Studying both portraits...",
    "Choreographing the embrace...",
    "Rendering the first frames...",
    "Adding a little extra warmth...",
    "Good things take time. Still working on it...",
];

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(3);

/// Index of the message shown after `index`.
pub fn next_index(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (index + 1) % len }
}

/// Handle to a running ticker task.
#[derive(Debug)]
pub struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Start ticking. `on_tick` gets every message after the first, one per
    /// `period`, starting one `period` from now.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn start<F>(messages: &'static [&'static str], period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(&'static str) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if messages.is_empty() {
                return;
            }
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut index = 0;
            loop {
                interval.tick().await;
                index = next_index(index, messages.len());
                on_tick(messages[index]);
            }
        });
        Self { handle }
    }

    /// Stop the ticker. No tick is delivered after this returns.
    pub fn stop(self) {
        // Drop does the work
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
