//! crates/exam_forge_core/src/history.rs
//!
//! Bounded, most-recent-first list of generated exams. Loaded once at startup
//! and written back through a [`HistoryRepository`] after every change.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Exam, ExamHistoryItem};
use crate::ports::{HistoryRepository, PortResult};

pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Default, Clone)]
pub struct ExamHistory {
    items: Vec<ExamHistoryItem>,
}

impl ExamHistory {
    /// Loads stored history. Unreadable data is logged and treated as empty.
    pub async fn load(repository: &dyn HistoryRepository) -> Self {
        match repository.load().await {
            Ok(items) => {
                let history = Self::from_items(items);
                info!("Loaded {} exam(s) from history", history.items.len());
                history
            }
            Err(e) => {
                warn!("Discarding stored exam history: {}", e);
                Self::default()
            }
        }
    }

    pub async fn persist(&self, repository: &dyn HistoryRepository) -> PortResult<()> {
        repository.save(&self.items).await
    }

    /// Keeps at most the first `HISTORY_LIMIT` items, which are the newest.
    pub fn from_items(mut items: Vec<ExamHistoryItem>) -> Self {
        items.truncate(HISTORY_LIMIT);
        Self { items }
    }

    /// Prepends a freshly generated exam and drops the oldest entries past the limit.
    pub fn record(&mut self, exam: &Exam) -> &ExamHistoryItem {
        let taken: HashSet<&str> = self.items.iter().map(|i| i.id.as_str()).collect();
        let id = if !exam.id.trim().is_empty() && !taken.contains(exam.id.as_str()) {
            exam.id.clone()
        } else {
            Uuid::new_v4().to_string()
        };

        let item = ExamHistoryItem {
            id,
            title: exam.title.clone(),
            date: exam.created_at.unwrap_or_else(Utc::now),
            exam: exam.clone(),
        };
        self.items.insert(0, item);
        self.items.truncate(HISTORY_LIMIT);
        &self.items[0]
    }

    pub fn items(&self) -> &[ExamHistoryItem] {
        &self.items
    }

    pub fn find(&self, id: &str) -> Option<&ExamHistoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
