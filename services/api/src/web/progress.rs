//! services/api/src/web/progress.rs
//!
//! Background task that steps through illustrative progress messages while an
//! exam is being generated. The messages carry no meaning beyond feedback.

use crate::web::state::GenerationTracker;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const PROGRESS_STEPS: [&str; 6] = [
    "Initializing Intelligence...",
    "Deconstructing Textbooks...",
    "Mapping Difficulty Vectors...",
    "Synthesizing Questions...",
    "Refining mark schemes...",
    "Finalizing structural integrity...",
];

/// Handle to a running ticker. Dropping it cancels the task.
pub struct ProgressTicker {
    cancellation_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Shows the first step immediately, then advances one step per interval
    /// and stays on the last one.
    pub fn start(tracker: Arc<GenerationTracker>, interval: Duration) -> Self {
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut next_step = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Some(step) = PROGRESS_STEPS.get(next_step) {
                            tracker.set_step(step);
                            next_step += 1;
                        }
                    }
                }
            }
            debug!("Progress ticker stopped.");
        });

        Self {
            cancellation_token,
            handle: Some(handle),
        }
    }

    /// Cancels the ticker and waits for the task to exit.
    pub async fn finish(mut self) {
        self.cancellation_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Progress ticker ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn advances_and_stops_on_finish() {
        let tracker = Arc::new(GenerationTracker::default());
        let guard = tracker.try_begin().unwrap();

        let ticker = ProgressTicker::start(Arc::clone(&tracker), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            tracker.snapshot().step.as_deref(),
            PROGRESS_STEPS.last().copied()
        );

        ticker.finish().await;
        drop(guard);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(tracker.snapshot().step.is_none());
    }

    #[tokio::test]
    async fn dropping_the_ticker_cancels_it() {
        let tracker = Arc::new(GenerationTracker::default());
        let ticker = ProgressTicker::start(Arc::clone(&tracker), Duration::from_millis(5));
        let token = ticker.cancellation_token.clone();
        drop(ticker);
        assert!(token.is_cancelled());
    }
}
