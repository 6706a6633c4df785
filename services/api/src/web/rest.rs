//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorResponse};
use crate::web::{
    generation::run_generation,
    protocol::{
        AnalysisResponse, CategoryQuery, ExamResponse, ExportQuery, GenerationStatusResponse,
        HistoryEntry, PendingUploadSummary, ResourceListResponse, ResourceSummary,
        SubmitTextRequest, UploadResponse, WorkspaceSettings, WorkspaceUpdate,
    },
    state::{AppState, Workspace},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use exam_forge_core::{
    domain::{Difficulty, QuestionCount, Resource, ResourceCategory},
    export::{export_exam, export_file_name},
    ports::PortError,
    presenter::ExamPresenter,
    shuffle::render_rng,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_resources_handler,
        upload_files_handler,
        submit_text_handler,
        delete_resource_handler,
        analyze_resource_handler,
        get_workspace_handler,
        update_workspace_handler,
        generate_exam_handler,
        generation_status_handler,
        current_exam_handler,
        toggle_reveal_handler,
        export_exam_handler,
        list_history_handler,
        open_history_handler,
    ),
    components(
        schemas(
            ResourceSummary,
            PendingUploadSummary,
            ResourceListResponse,
            UploadResponse,
            SubmitTextRequest,
            AnalysisResponse,
            WorkspaceSettings,
            WorkspaceUpdate,
            GenerationStatusResponse,
            ExamResponse,
            HistoryEntry,
            ErrorResponse,
        )
    ),
    tags(
        (name = "ExamForge API", description = "Assemble study resources and generate practice exams.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Helpers
//=========================================================================================

fn parse_category(raw: Option<&str>, fallback: ResourceCategory) -> Result<ResourceCategory, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse::<ResourceCategory>()
            .map_err(|e| ApiError::BadRequest(e.to_string())),
        None => Ok(fallback),
    }
}

fn no_exam() -> ApiError {
    PortError::NotFound("No exam has been generated yet.".to_string()).into()
}

fn workspace_settings(workspace: &Workspace) -> WorkspaceSettings {
    WorkspaceSettings {
        active_category: workspace.active_category.to_string(),
        num_questions: workspace.exam_config.question_count.get(),
        difficulty: workspace.exam_config.difficulty.to_string(),
        focus_topics: workspace.exam_config.focus_topics.clone(),
    }
}

/// Header-safe version of the export file name.
fn attachment_name(title: &str) -> String {
    export_file_name(title)
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect()
}

//=========================================================================================
// Resource Handlers
//=========================================================================================

/// List the resources in the workspace and the uploads still being read.
#[utoipa::path(
    get,
    path = "/resources",
    responses(
        (status = 200, description = "Current resources", body = ResourceListResponse)
    )
)]
pub async fn list_resources_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = app_state.workspace.lock().await;
    Ok(Json(ResourceListResponse {
        resources: workspace.inventory.resources().iter().map(ResourceSummary::from).collect(),
        pending: workspace.inventory.pending().iter().map(PendingUploadSummary::from).collect(),
    }))
}

/// Upload one or more files as resources.
///
/// Each file part is read independently; images and PDFs are stored as base64,
/// everything else as text. The category defaults to the active one.
#[utoipa::path(
    post,
    path = "/resources/files",
    request_body(content_type = "multipart/form-data", description = "One or more files."),
    params(CategoryQuery),
    responses(
        (status = 201, description = "Files added", body = UploadResponse),
        (status = 400, description = "No files or an unknown category", body = ErrorResponse)
    )
)]
pub async fn upload_files_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let category = {
        let workspace = app_state.workspace.lock().await;
        parse_category(query.category.as_deref(), workspace.active_category)?
    };

    let mut reads = JoinSet::new();
    let mut failed = Vec::new();
    let mut stream_error = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Multipart stream ended early: {}", e);
                stream_error = Some(e.to_string());
                break;
            }
        };

        let name = field.file_name().unwrap_or("untitled").to_string();
        let mime_type = field.content_type().map(str::to_string);
        let upload = app_state
            .workspace
            .lock()
            .await
            .inventory
            .begin_upload(name.clone(), category);

        match field.bytes().await {
            Ok(bytes) => {
                let workspace = Arc::clone(&app_state.workspace);
                reads.spawn(async move {
                    let resource = Resource::from_file(&upload, mime_type.as_deref(), &bytes);
                    let summary = ResourceSummary::from(&resource);
                    let added = workspace.lock().await.inventory.complete_upload(resource);
                    added.then_some(summary)
                });
            }
            Err(e) => {
                warn!("Failed to read uploaded file '{}': {}", name, e);
                app_state.workspace.lock().await.inventory.fail_upload(upload.id);
                failed.push(name);
            }
        }
    }

    let mut added = Vec::new();
    while let Some(joined) = reads.join_next().await {
        match joined {
            Ok(Some(summary)) => added.push(summary),
            Ok(None) => {}
            Err(e) => error!("Upload task failed: {}", e),
        }
    }

    if added.is_empty() && failed.is_empty() {
        return Err(ApiError::BadRequest(stream_error.unwrap_or_else(|| {
            "Multipart form must include at least one file".to_string()
        })));
    }

    info!("Added {} uploaded resource(s) as {}", added.len(), category);
    Ok((StatusCode::CREATED, Json(UploadResponse { added, failed })))
}

/// Add pasted text as a single resource. Blank text is ignored.
#[utoipa::path(
    post,
    path = "/resources/text",
    request_body = SubmitTextRequest,
    responses(
        (status = 201, description = "Text added", body = ResourceSummary),
        (status = 204, description = "Blank text, nothing added"),
        (status = 400, description = "Unknown category", body = ErrorResponse)
    )
)]
pub async fn submit_text_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SubmitTextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut workspace = app_state.workspace.lock().await;
    let category = parse_category(payload.category.as_deref(), workspace.active_category)?;

    Ok(match workspace.inventory.submit_text(&payload.text, category) {
        Some(resource) => (StatusCode::CREATED, Json(ResourceSummary::from(resource))).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Remove a resource.
#[utoipa::path(
    delete,
    path = "/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "No such resource", body = ErrorResponse)
    )
)]
pub async fn delete_resource_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .workspace
        .lock()
        .await
        .inventory
        .remove(id)
        .ok_or_else(|| PortError::NotFound(format!("resource {}", id)))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Summarize one resource. Analysis failures are reported in the text, never as errors.
#[utoipa::path(
    post,
    path = "/resources/{id}/analysis",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Analysis text", body = AnalysisResponse),
        (status = 404, description = "No such resource", body = ErrorResponse)
    )
)]
pub async fn analyze_resource_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = app_state
        .workspace
        .lock()
        .await
        .inventory
        .get(id)
        .cloned()
        .ok_or_else(|| PortError::NotFound(format!("resource {}", id)))?;

    let analysis = app_state.analyzer.analyze_resource(&resource).await;
    Ok(Json(AnalysisResponse {
        resource_id: id,
        analysis,
    }))
}

//=========================================================================================
// Workspace Handlers
//=========================================================================================

/// Current active category and exam configuration.
#[utoipa::path(
    get,
    path = "/workspace",
    responses((status = 200, description = "Workspace settings", body = WorkspaceSettings))
)]
pub async fn get_workspace_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = app_state.workspace.lock().await;
    Ok(Json(workspace_settings(&workspace)))
}

/// Change the active category or the exam configuration.
#[utoipa::path(
    put,
    path = "/workspace",
    request_body = WorkspaceUpdate,
    responses(
        (status = 200, description = "Updated settings", body = WorkspaceSettings),
        (status = 400, description = "Invalid value", body = ErrorResponse)
    )
)]
pub async fn update_workspace_handler(
    State(app_state): State<Arc<AppState>>,
    Json(update): Json<WorkspaceUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let mut workspace = app_state.workspace.lock().await;

    // Validate everything before applying anything.
    let active_category = parse_category(update.active_category.as_deref(), workspace.active_category)?;
    let question_count = match update.num_questions {
        Some(n) => QuestionCount::new(n).map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => workspace.exam_config.question_count,
    };
    let difficulty = match update.difficulty.as_deref() {
        Some(raw) => raw
            .parse::<Difficulty>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => workspace.exam_config.difficulty,
    };

    workspace.active_category = active_category;
    workspace.exam_config.question_count = question_count;
    workspace.exam_config.difficulty = difficulty;
    if let Some(focus_topics) = update.focus_topics {
        workspace.exam_config.focus_topics = focus_topics;
    }

    Ok(Json(workspace_settings(&workspace)))
}

//=========================================================================================
// Exam Handlers
//=========================================================================================

/// Generate an exam from every resource in the workspace.
///
/// Blocks until the backend answers. Poll `/exams/status` for progress.
#[utoipa::path(
    post,
    path = "/exams",
    responses(
        (status = 201, description = "Exam generated, solutions hidden", body = ExamResponse),
        (status = 400, description = "No resources", body = ErrorResponse),
        (status = 409, description = "A generation is already running", body = ErrorResponse),
        (status = 502, description = "The backend failed or returned an unusable exam", body = ErrorResponse)
    )
)]
pub async fn generate_exam_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let exam = run_generation(&app_state).await?;
    Ok((StatusCode::CREATED, Json(ExamResponse { exam })))
}

/// Whether a generation is running, and its current progress message.
#[utoipa::path(
    get,
    path = "/exams/status",
    responses((status = 200, description = "Generation status", body = GenerationStatusResponse))
)]
pub async fn generation_status_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(app_state.generation.snapshot()))
}

/// Render the current exam. Matching and ordering items get a fresh order.
#[utoipa::path(
    get,
    path = "/exam",
    responses(
        (status = 200, description = "Rendered exam", body = ExamResponse),
        (status = 404, description = "No current exam", body = ErrorResponse)
    )
)]
pub async fn current_exam_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = app_state.workspace.lock().await;
    let presenter = workspace.presenter.as_ref().ok_or_else(no_exam)?;
    Ok(Json(ExamResponse {
        exam: presenter.render(rand::random()),
    }))
}

/// Toggle the solutions of every question at once.
#[utoipa::path(
    post,
    path = "/exam/reveal",
    responses(
        (status = 200, description = "Rendered exam after toggling", body = ExamResponse),
        (status = 404, description = "No current exam", body = ErrorResponse)
    )
)]
pub async fn toggle_reveal_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut workspace = app_state.workspace.lock().await;
    let presenter = workspace.presenter.as_mut().ok_or_else(no_exam)?;
    presenter.toggle_reveal();
    Ok(Json(ExamResponse {
        exam: presenter.render(rand::random()),
    }))
}

/// Download the current exam as plain text.
#[utoipa::path(
    get,
    path = "/exam/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Exam text", content_type = "text/plain", body = String),
        (status = 404, description = "No current exam", body = ErrorResponse)
    )
)]
pub async fn export_exam_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = app_state.workspace.lock().await;
    let exam = workspace.presenter.as_ref().ok_or_else(no_exam)?.exam();

    let text = export_exam(exam, query.solutions.unwrap_or(true), &mut render_rng(rand::random()));
    let disposition = format!("attachment; filename=\"{}\"", attachment_name(&exam.title));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        text,
    ))
}

//=========================================================================================
// History Handlers
//=========================================================================================

/// The ten most recent exams, newest first.
#[utoipa::path(
    get,
    path = "/history",
    responses((status = 200, description = "History entries", body = Vec<HistoryEntry>))
)]
pub async fn list_history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = app_state.workspace.lock().await;
    let entries: Vec<HistoryEntry> = workspace.history.items().iter().map(HistoryEntry::from).collect();
    Ok(Json(entries))
}

/// Make a past exam the current one, with solutions hidden.
#[utoipa::path(
    post,
    path = "/history/{id}/open",
    params(("id" = String, Path, description = "History entry id")),
    responses(
        (status = 200, description = "Rendered exam", body = ExamResponse),
        (status = 404, description = "No such entry", body = ErrorResponse)
    )
)]
pub async fn open_history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut workspace = app_state.workspace.lock().await;
    let exam = workspace
        .history
        .find(&id)
        .map(|item| item.exam.clone())
        .ok_or_else(|| PortError::NotFound(format!("history entry {}", id)))?;

    let presenter = ExamPresenter::new(exam);
    let rendered = presenter.render(rand::random());
    workspace.presenter = Some(presenter);
    Ok(Json(ExamResponse { exam: rendered }))
}
