//! services/api/src/web/generation.rs
//!
//! One exam generation: snapshot the workspace, call the backend with the
//! progress ticker running, then store the result as the current exam and at
//! the head of the history.

use crate::error::ApiError;
use crate::web::{progress::ProgressTicker, state::AppState};
use chrono::Utc;
use exam_forge_core::{
    ports::PortError,
    presenter::{ExamPresenter, RenderedExam},
};
use tracing::{error, info, warn};

pub async fn run_generation(app_state: &AppState) -> Result<RenderedExam, ApiError> {
    let (resources, exam_config) = {
        let workspace = app_state.workspace.lock().await;
        if workspace.inventory.is_empty() {
            return Err(PortError::InvalidInput("Please add at least one resource!".to_string()).into());
        }
        (workspace.inventory.resources().to_vec(), workspace.exam_config.clone())
    };

    let _guard = app_state.generation.try_begin().ok_or_else(|| {
        ApiError::Conflict("An exam is already being generated.".to_string())
    })?;

    app_state.workspace.lock().await.presenter = None;
    info!(
        resources = resources.len(),
        questions = exam_config.question_count.get(),
        difficulty = %exam_config.difficulty,
        "Starting exam generation"
    );

    let ticker = ProgressTicker::start(app_state.generation.clone(), app_state.config.progress_interval);
    let result = app_state.generator.generate_exam(&resources, &exam_config).await;
    ticker.finish().await;

    let mut exam = result.map_err(|e| {
        error!("Exam generation failed: {}", e);
        e
    })?;
    exam.created_at = Some(Utc::now());

    let (rendered, history) = {
        let mut workspace = app_state.workspace.lock().await;
        workspace.history.record(&exam);
        let presenter = ExamPresenter::new(exam);
        let rendered = presenter.render(rand::random());
        workspace.presenter = Some(presenter);
        (rendered, workspace.history.clone())
    };

    if let Err(e) = history.persist(app_state.history_repo.as_ref()).await {
        warn!("Failed to persist exam history: {}", e);
    }

    Ok(rendered)
}
