pub mod generation;
pub mod progress;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the full application router, Swagger UI included.
pub fn router(app_state: Arc<AppState>) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;

    let api_router = Router::new()
        .route("/resources", get(rest::list_resources_handler))
        .route("/resources/files", post(rest::upload_files_handler))
        .route("/resources/text", post(rest::submit_text_handler))
        .route("/resources/{id}", delete(rest::delete_resource_handler))
        .route("/resources/{id}/analysis", post(rest::analyze_resource_handler))
        .route(
            "/workspace",
            get(rest::get_workspace_handler).put(rest::update_workspace_handler),
        )
        .route("/exams", post(rest::generate_exam_handler))
        .route("/exams/status", get(rest::generation_status_handler))
        .route("/exam", get(rest::current_exam_handler))
        .route("/exam/reveal", post(rest::toggle_reveal_handler))
        .route("/exam/export", get(rest::export_exam_handler))
        .route("/history", get(rest::list_history_handler))
        .route("/history/{id}/open", post(rest::open_history_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
