//! services/api/src/web/state.rs
//!
//! Defines the application's shared state: the single in-memory workspace and
//! the progress of the generation in flight.

use crate::config::Config;
use crate::web::protocol::GenerationStatusResponse;
use exam_forge_core::{
    domain::{ExamConfig, ResourceCategory},
    history::ExamHistory,
    inventory::ResourceInventory,
    ports::{ExamGenerationService, HistoryRepository, ResourceAnalysisService},
    presenter::ExamPresenter,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Mutex as AsyncMutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn ExamGenerationService>,
    pub analyzer: Arc<dyn ResourceAnalysisService>,
    pub history_repo: Arc<dyn HistoryRepository>,
    pub workspace: Arc<AsyncMutex<Workspace>>,
    pub generation: Arc<GenerationTracker>,
}

impl AppState {
    /// Builds the state and loads the stored history once.
    pub async fn new(
        config: Arc<Config>,
        generator: Arc<dyn ExamGenerationService>,
        analyzer: Arc<dyn ResourceAnalysisService>,
        history_repo: Arc<dyn HistoryRepository>,
    ) -> Self {
        let history = ExamHistory::load(history_repo.as_ref()).await;
        Self {
            config,
            generator,
            analyzer,
            history_repo,
            workspace: Arc::new(AsyncMutex::new(Workspace::new(history))),
            generation: Arc::new(GenerationTracker::default()),
        }
    }
}

//=========================================================================================
// Workspace (The Single User's Session)
//=========================================================================================

/// Everything the user has assembled so far.
#[derive(Debug, Default)]
pub struct Workspace {
    pub inventory: ResourceInventory,
    pub exam_config: ExamConfig,
    /// Category applied to new uploads and text submissions.
    pub active_category: ResourceCategory,
    pub presenter: Option<ExamPresenter>,
    pub history: ExamHistory,
}

impl Workspace {
    pub fn new(history: ExamHistory) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }
}

//=========================================================================================
// Generation Progress
//=========================================================================================

/// Tracks whether a generation is running and which progress message to show.
/// Guarded by a blocking mutex; it is never held across an await.
#[derive(Debug, Default)]
pub struct GenerationTracker {
    status: Mutex<GenerationStatusResponse>,
}

impl GenerationTracker {
    fn lock(&self) -> MutexGuard<'_, GenerationStatusResponse> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a generation as started. `None` if one is already running.
    pub fn try_begin(self: &Arc<Self>) -> Option<GenerationGuard> {
        let mut status = self.lock();
        if status.generating {
            return None;
        }
        status.generating = true;
        status.step = None;
        Some(GenerationGuard {
            tracker: Arc::clone(self),
        })
    }

    /// Ignored unless a generation is running, so a late tick cannot
    /// resurrect a cleared status.
    pub fn set_step(&self, step: &str) {
        let mut status = self.lock();
        if status.generating {
            status.step = Some(step.to_string());
        }
    }

    pub fn snapshot(&self) -> GenerationStatusResponse {
        self.lock().clone()
    }
}

/// Clears the generation status when dropped, including when the request
/// future is dropped mid-flight.
#[derive(Debug)]
pub struct GenerationGuard {
    tracker: Arc<GenerationTracker>,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        let mut status = self.tracker.lock();
        status.generating = false;
        status.step = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_generation_at_a_time() {
        let tracker = Arc::new(GenerationTracker::default());
        let guard = tracker.try_begin().unwrap();
        assert!(tracker.try_begin().is_none());

        tracker.set_step("Synthesizing Questions...");
        assert_eq!(tracker.snapshot().step.as_deref(), Some("Synthesizing Questions..."));

        drop(guard);
        let status = tracker.snapshot();
        assert!(!status.generating);
        assert!(status.step.is_none());
        assert!(tracker.try_begin().is_some());
    }

    #[test]
    fn steps_are_ignored_when_idle() {
        let tracker = GenerationTracker::default();
        tracker.set_step("Initializing Intelligence...");
        assert!(tracker.snapshot().step.is_none());
    }
}
