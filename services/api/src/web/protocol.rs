//! services/api/src/web/protocol.rs
//!
//! Request and response payloads of the HTTP API. Core types stay free of
//! OpenAPI concerns; these structs carry the schema annotations instead.

use chrono::{DateTime, Utc};
use exam_forge_core::{
    domain::{ExamHistoryItem, PendingUpload, Resource},
    presenter::RenderedExam,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Resources
//=========================================================================================

/// A resource without its payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub id: Uuid,
    pub name: String,
    #[schema(example = "TEXTBOOK")]
    pub category: String,
    pub mime_type: String,
    pub is_binary: bool,
    /// Length of the stored content (base64 characters for binary resources).
    pub content_length: usize,
}

impl From<&Resource> for ResourceSummary {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id,
            name: resource.name.clone(),
            category: resource.category.to_string(),
            mime_type: resource.mime_type.clone(),
            is_binary: resource.is_binary,
            content_length: resource.content.len(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingUploadSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

impl From<&PendingUpload> for PendingUploadSummary {
    fn from(upload: &PendingUpload) -> Self {
        Self {
            id: upload.id,
            name: upload.name.clone(),
            category: upload.category.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResourceListResponse {
    pub resources: Vec<ResourceSummary>,
    pub pending: Vec<PendingUploadSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub added: Vec<ResourceSummary>,
    /// Names of files whose read failed.
    pub failed: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitTextRequest {
    pub text: String,
    /// Defaults to the workspace's active category.
    #[schema(example = "SPECIFICATION")]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryQuery {
    /// Defaults to the workspace's active category.
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub resource_id: Uuid,
    pub analysis: String,
}

//=========================================================================================
// Workspace settings
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSettings {
    #[schema(example = "TEXTBOOK")]
    pub active_category: String,
    #[schema(example = 10)]
    pub num_questions: u32,
    #[schema(example = "Medium")]
    pub difficulty: String,
    pub focus_topics: String,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceUpdate {
    pub active_category: Option<String>,
    pub num_questions: Option<u32>,
    pub difficulty: Option<String>,
    pub focus_topics: Option<String>,
}

//=========================================================================================
// Exams
//=========================================================================================

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct GenerationStatusResponse {
    pub generating: bool,
    /// The current progress message while generating.
    pub step: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExamResponse {
    #[schema(value_type = Object)]
    pub exam: RenderedExam,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Include solutions and explanations. Defaults to true.
    pub solutions: Option<bool>,
}

//=========================================================================================
// History
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub question_count: usize,
    pub total_marks: u32,
}

impl From<&ExamHistoryItem> for HistoryEntry {
    fn from(item: &ExamHistoryItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            date: item.date,
            question_count: item.exam.questions.len(),
            total_marks: item.exam.total_marks,
        }
    }
}
