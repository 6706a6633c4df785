//! services/api/src/adapters/history_file.rs
//!
//! Stores the exam history as a single JSON document on disk. Implements the
//! `HistoryRepository` port from the core crate.

use async_trait::async_trait;
use exam_forge_core::{
    domain::ExamHistoryItem,
    ports::{HistoryRepository, PortError, PortResult},
};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonFileHistoryRepository {
    path: PathBuf,
}

impl JsonFileHistoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistoryRepository for JsonFileHistoryRepository {
    /// A missing file is an empty history. Anything unreadable is a storage error.
    async fn load(&self) -> PortResult<Vec<ExamHistoryItem>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PortError::Storage(e.to_string())),
        };

        serde_json::from_slice(&raw).map_err(|e| {
            PortError::Storage(format!("{} is not a valid history file: {}", self.path.display(), e))
        })
    }

    /// Writes to a sibling temp file first, then renames it over the target.
    async fn save(&self, items: &[ExamHistoryItem]) -> PortResult<()> {
        let json = serde_json::to_vec_pretty(items).map_err(|e| PortError::Unexpected(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Storage(e.to_string()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;

        debug!("Saved {} history item(s) to {}", items.len(), self.path.display());
        Ok(())
    }
}
