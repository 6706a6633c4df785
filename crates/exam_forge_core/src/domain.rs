//! crates/exam_forge_core/src/domain.rs
//!
//! Defines the core data structures for the application: the study material a
//! user supplies, the parameters of a generation request, and the validated
//! exam model returned by the inference backend.
//!
//! `Question` and `Exam` serialize through the flat wire records in
//! [`crate::response`], so the same JSON shape is used for backend responses
//! and for the persisted history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::response::{ExamRecord, QuestionRecord, ResponseShapeError};

pub const TEXT_MIME_TYPE: &str = "text/plain";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Returned when a user-supplied enum value or bounded number is out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainValueError {
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("Question count must be between {min} and {max} in steps of {step}, got {value}")]
    QuestionCountOutOfRange {
        value: u32,
        min: u32,
        max: u32,
        step: u32,
    },
}

//=========================================================================================
// Resources
//=========================================================================================

/// How a resource should be weighed when the exam is composed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceCategory {
    #[default]
    Textbook,
    Specification,
    Sample,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 3] = [
        ResourceCategory::Textbook,
        ResourceCategory::Specification,
        ResourceCategory::Sample,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Textbook => "TEXTBOOK",
            ResourceCategory::Specification => "SPECIFICATION",
            ResourceCategory::Sample => "SAMPLE",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = DomainValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DomainValueError::UnknownVariant {
                kind: "resource category",
                value: trimmed.to_string(),
            })
    }
}

/// One unit of user-supplied study material.
///
/// `content` holds base64 when `is_binary` is set (images and PDFs) and plain
/// text otherwise. Build resources through [`crate::inventory`] so the two stay
/// in agreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: Uuid,
    pub category: ResourceCategory,
    pub content: String,
    pub mime_type: String,
    pub name: String,
    pub is_binary: bool,
}

/// A file read that has been submitted but has not completed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUpload {
    pub id: Uuid,
    pub name: String,
    pub category: ResourceCategory,
}

//=========================================================================================
// Exam configuration
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DomainValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
            .into_iter()
            .find(|difficulty| difficulty.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DomainValueError::UnknownVariant {
                kind: "difficulty",
                value: trimmed.to_string(),
            })
    }
}

/// Number of questions to request, limited to the values the question slider offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct QuestionCount(u32);

impl QuestionCount {
    pub const MIN: u32 = 5;
    pub const MAX: u32 = 30;
    pub const STEP: u32 = 5;

    pub fn new(value: u32) -> Result<Self, DomainValueError> {
        if (Self::MIN..=Self::MAX).contains(&value) && value % Self::STEP == 0 {
            Ok(Self(value))
        } else {
            Err(DomainValueError::QuestionCountOutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
                step: Self::STEP,
            })
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for QuestionCount {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<u32> for QuestionCount {
    type Error = DomainValueError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestionCount> for u32 {
    fn from(count: QuestionCount) -> Self {
        count.0
    }
}

/// Parameters for one generation request. Passed by value; it has no lifecycle of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfig {
    #[serde(rename = "numQuestions")]
    pub question_count: QuestionCount,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub focus_topics: String,
}

//=========================================================================================
// Exam model
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub left: String,
    pub right: String,
}

impl MatchingPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// The seven question formats the backend is asked to mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
    Essay,
    TrueFalse,
    FillBlank,
    Matching,
    Ordering,
}

impl QuestionType {
    pub const ALL: [QuestionType; 7] = [
        QuestionType::MultipleChoice,
        QuestionType::ShortAnswer,
        QuestionType::Essay,
        QuestionType::TrueFalse,
        QuestionType::FillBlank,
        QuestionType::Matching,
        QuestionType::Ordering,
    ];

    /// Wire name, e.g. `multiple_choice`.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::Essay => "essay",
            QuestionType::TrueFalse => "true_false",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::Matching => "matching",
            QuestionType::Ordering => "ordering",
        }
    }

    /// Human label, e.g. `multiple choice`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific material of a question. Only the fields a type needs exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice { options: Vec<String> },
    TrueFalse { options: Vec<String> },
    ShortAnswer,
    Essay,
    FillBlank,
    Matching { pairs: Vec<MatchingPair> },
    /// `items` are in the canonical (correct) order.
    Ordering { items: Vec<String> },
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionKind::ShortAnswer => QuestionType::ShortAnswer,
            QuestionKind::Essay => QuestionType::Essay,
            QuestionKind::FillBlank => QuestionType::FillBlank,
            QuestionKind::Matching { .. } => QuestionType::Matching,
            QuestionKind::Ordering { .. } => QuestionType::Ordering,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub correct_answer: String,
    pub explanation: String,
    pub marks: u32,
    pub source_reference: Option<String>,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExamRecord", into = "ExamRecord")]
pub struct Exam {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub duration_minutes: u32,
    /// Reported by the backend; never recomputed from the questions.
    pub total_marks: u32,
    /// Stamped by the client when generation succeeds.
    pub created_at: Option<DateTime<Utc>>,
}

impl Exam {
    pub fn question_marks_sum(&self) -> u64 {
        self.questions.iter().map(|q| u64::from(q.marks)).sum()
    }
}

impl TryFrom<ExamRecord> for Exam {
    type Error = ResponseShapeError;

    fn try_from(record: ExamRecord) -> Result<Self, Self::Error> {
        record.into_domain()
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = ResponseShapeError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        record.into_domain()
    }
}

/// One entry of the bounded generation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamHistoryItem {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub exam: Exam,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(
            "specification".parse::<ResourceCategory>().unwrap(),
            ResourceCategory::Specification
        );
        assert_eq!(" SAMPLE ".parse::<ResourceCategory>().unwrap(), ResourceCategory::Sample);
        assert!("notes".parse::<ResourceCategory>().is_err());
    }

    #[test]
    fn question_count_is_bounded_and_stepped() {
        assert_eq!(QuestionCount::default().get(), 10);
        assert!(QuestionCount::new(5).is_ok());
        assert!(QuestionCount::new(30).is_ok());
        assert!(QuestionCount::new(0).is_err());
        assert!(QuestionCount::new(12).is_err());
        assert!(QuestionCount::new(35).is_err());
    }

    #[test]
    fn exam_config_uses_camel_case_wire_names() {
        let config: ExamConfig =
            serde_json::from_str(r#"{"numQuestions":15,"difficulty":"Hard","focusTopics":"Cells"}"#)
                .unwrap();
        assert_eq!(config.question_count.get(), 15);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.focus_topics, "Cells");

        let rejected = serde_json::from_str::<ExamConfig>(r#"{"numQuestions":7,"difficulty":"Easy"}"#);
        assert!(rejected.is_err());
    }

    #[test]
    fn question_type_label_replaces_underscores() {
        assert_eq!(QuestionType::MultipleChoice.label(), "multiple choice");
        assert_eq!(QuestionType::Essay.label(), "essay");
    }
}
