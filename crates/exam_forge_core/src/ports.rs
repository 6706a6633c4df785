//! crates/exam_forge_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the inference backend and of the storage used for the
//! exam history.

use async_trait::async_trait;

use crate::domain::{Exam, ExamConfig, ExamHistoryItem, Resource};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// Shown when an inference failure carries no message of its own.
pub const GENERIC_GENERATION_FAILURE: &str =
    "Failed to forge the exam. Try reducing the number of resources or the question count.";

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The inference backend failed or returned nothing usable. The message is
    /// meant to be shown to the user as-is.
    #[error("{0}")]
    Inference(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Builds an inference error from the most specific message available.
    pub fn inference(message: impl AsRef<str>) -> Self {
        let message = message.as_ref().trim();
        if message.is_empty() {
            PortError::Inference(GENERIC_GENERATION_FAILURE.to_string())
        } else {
            PortError::Inference(message.to_string())
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ExamGenerationService: Send + Sync {
    /// Packages the resources and configuration into one inference request and
    /// returns the validated exam. `created_at` is left unset.
    async fn generate_exam(&self, resources: &[Resource], config: &ExamConfig) -> PortResult<Exam>;
}

#[async_trait]
pub trait ResourceAnalysisService: Send + Sync {
    /// Summarizes one resource. Never fails: problems collapse into a fixed message.
    async fn analyze_resource(&self, resource: &Resource) -> String;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn load(&self) -> PortResult<Vec<ExamHistoryItem>>;

    /// Replaces the stored history with `items`.
    async fn save(&self, items: &[ExamHistoryItem]) -> PortResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_error_falls_back_to_generic_hint() {
        assert_eq!(PortError::inference("  ").to_string(), GENERIC_GENERATION_FAILURE);
        assert_eq!(PortError::inference("quota exceeded").to_string(), "quota exceeded");
    }
}
