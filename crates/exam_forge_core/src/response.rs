//! crates/exam_forge_core/src/response.rs
//!
//! Turns raw backend output into the validated exam model.
//!
//! The backend answers with loosely typed JSON: a flat question record whose
//! optional fields depend on its `type`. The records here mirror that shape and
//! are converted into [`QuestionKind`] at the boundary, rejecting anything the
//! declared type cannot be rendered from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt::Display;
use tracing::{debug, warn};

use crate::domain::{Exam, MatchingPair, Question, QuestionKind, QuestionType};
use crate::ports::PortError;

pub const REMEDIATION_HINT: &str = "Try reducing the number of resources or the question count.";
pub const ANALYSIS_UNAVAILABLE: &str = "Analysis unavailable.";
pub const ANALYSIS_FAILED: &str = "Error analyzing this resource.";

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseShapeError {
    #[error("response does not describe an exam: {0}")]
    Malformed(String),
    #[error("exam contains no questions")]
    NoQuestions,
    #[error("question '{question}' has no marks")]
    NonPositiveMarks { question: String },
    #[error("{field} must be a whole number, got {value}")]
    NotAWholeNumber { field: String, value: String },
    #[error("{question_type} question '{question}' is missing {field}")]
    MissingTypeField {
        question: String,
        question_type: QuestionType,
        field: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExamParseError {
    #[error("The inference step produced no output.")]
    Empty,
    #[error("The inference step produced no usable output ({0}).")]
    Unparsable(String),
    #[error("The generated exam was malformed: {0}.")]
    Shape(#[from] ResponseShapeError),
}

impl ExamParseError {
    pub fn user_message(&self) -> String {
        format!("{} {}", self, REMEDIATION_HINT)
    }
}

impl From<ExamParseError> for PortError {
    fn from(err: ExamParseError) -> Self {
        PortError::inference(err.user_message())
    }
}

//=========================================================================================
// Wire records
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_pairs: Option<Vec<MatchingPair>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_items: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    pub marks: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionRecord>,
    /// Optional in responses; absent reads as zero.
    #[serde(default = "zero_minutes")]
    pub duration_minutes: Number,
    pub total_marks: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn zero_minutes() -> Number {
    Number::from(0u32)
}

fn whole_number(field: impl Into<String>, number: &Number) -> Result<u32, ResponseShapeError> {
    let converted = match number.as_u64() {
        Some(n) => u32::try_from(n).ok(),
        None => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u32),
    };
    converted.ok_or_else(|| ResponseShapeError::NotAWholeNumber {
        field: field.into(),
        value: number.to_string(),
    })
}

/// Keeps a list only when it has at least one entry.
fn non_empty<T>(list: Option<Vec<T>>) -> Option<Vec<T>> {
    list.filter(|items| !items.is_empty())
}

impl QuestionRecord {
    pub(crate) fn into_domain(self) -> Result<Question, ResponseShapeError> {
        let missing = |field: &'static str| ResponseShapeError::MissingTypeField {
            question: self.id.clone(),
            question_type: self.question_type,
            field,
        };

        let kind = match self.question_type {
            QuestionType::MultipleChoice => QuestionKind::MultipleChoice {
                options: non_empty(self.options.clone()).ok_or_else(|| missing("options"))?,
            },
            QuestionType::TrueFalse => QuestionKind::TrueFalse {
                options: non_empty(self.options.clone()).ok_or_else(|| missing("options"))?,
            },
            QuestionType::Matching => QuestionKind::Matching {
                pairs: non_empty(self.matching_pairs.clone()).ok_or_else(|| missing("matchingPairs"))?,
            },
            QuestionType::Ordering => QuestionKind::Ordering {
                items: non_empty(self.ordered_items.clone()).ok_or_else(|| missing("orderedItems"))?,
            },
            QuestionType::ShortAnswer => QuestionKind::ShortAnswer,
            QuestionType::Essay => QuestionKind::Essay,
            QuestionType::FillBlank => QuestionKind::FillBlank,
        };

        let marks = whole_number(format!("marks of question '{}'", self.id), &self.marks)?;
        if marks == 0 {
            return Err(ResponseShapeError::NonPositiveMarks { question: self.id });
        }

        Ok(Question {
            id: self.id,
            text: self.text,
            kind,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            marks,
            source_reference: self.source_reference.filter(|s| !s.trim().is_empty()),
        })
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        let question_type = question.question_type();
        let (options, matching_pairs, ordered_items) = match question.kind {
            QuestionKind::MultipleChoice { options } | QuestionKind::TrueFalse { options } => {
                (Some(options), None, None)
            }
            QuestionKind::Matching { pairs } => (None, Some(pairs), None),
            QuestionKind::Ordering { items } => (None, None, Some(items)),
            QuestionKind::ShortAnswer | QuestionKind::Essay | QuestionKind::FillBlank => {
                (None, None, None)
            }
        };

        Self {
            id: question.id,
            text: question.text,
            question_type,
            options,
            matching_pairs,
            ordered_items,
            correct_answer: question.correct_answer,
            explanation: question.explanation,
            marks: Number::from(question.marks),
            source_reference: question.source_reference,
        }
    }
}

impl ExamRecord {
    pub(crate) fn into_domain(self) -> Result<Exam, ResponseShapeError> {
        if self.questions.is_empty() {
            return Err(ResponseShapeError::NoQuestions);
        }

        let questions = self
            .questions
            .into_iter()
            .map(QuestionRecord::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        let exam = Exam {
            id: self.id,
            title: self.title,
            description: self.description,
            questions,
            duration_minutes: whole_number("durationMinutes", &self.duration_minutes)?,
            total_marks: whole_number("totalMarks", &self.total_marks)?,
            created_at: self.created_at,
        };

        let sum = exam.question_marks_sum();
        if sum != u64::from(exam.total_marks) {
            warn!(
                exam_id = %exam.id,
                total_marks = exam.total_marks,
                question_marks = sum,
                "Exam total marks differ from the sum of question marks"
            );
        }

        Ok(exam)
    }
}

impl From<Exam> for ExamRecord {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            questions: exam.questions.into_iter().map(QuestionRecord::from).collect(),
            duration_minutes: Number::from(exam.duration_minutes),
            total_marks: Number::from(exam.total_marks),
            created_at: exam.created_at,
        }
    }
}

//=========================================================================================
// Parsing policy
//=========================================================================================

/// The span from the first `{` to the last `}`, if there is one.
fn outermost_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parses a generation response. A direct JSON parse is tried first; if that
/// fails the outermost brace-delimited span is reparsed once before giving up.
pub fn parse_exam(raw: &str) -> Result<Exam, ExamParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExamParseError::Empty);
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(direct_err) => {
            debug!("Direct parse failed ({}), retrying on the outermost object span", direct_err);
            let span = outermost_object_span(trimmed)
                .ok_or_else(|| ExamParseError::Unparsable(direct_err.to_string()))?;
            serde_json::from_str(span).map_err(|e| ExamParseError::Unparsable(e.to_string()))?
        }
    };

    let record: ExamRecord = serde_json::from_value(value)
        .map_err(|e| ResponseShapeError::Malformed(e.to_string()))?;

    Ok(record.into_domain()?)
}

/// Collapses the outcome of an analysis call into the text shown to the user.
pub fn analysis_outcome<E: Display>(result: Result<String, E>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => ANALYSIS_UNAVAILABLE.to_string(),
        Err(err) => {
            warn!("Resource analysis failed: {}", err);
            ANALYSIS_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAM_JSON: &str = r#"{
        "id": "exam-1",
        "title": "Cell Biology",
        "description": "Practice paper",
        "durationMinutes": 45,
        "totalMarks": 6,
        "questions": [
            {
                "id": "q1",
                "text": "Capital of France?",
                "type": "multiple_choice",
                "options": ["Paris", "Rome", "Berlin", "Madrid"],
                "correctAnswer": "Paris",
                "explanation": "It is.",
                "marks": 1
            },
            {
                "id": "q2",
                "text": "Match the terms.",
                "type": "matching",
                "matchingPairs": [{"left": "Cell", "right": "Biology"}, {"left": "Atom", "right": "Physics"}],
                "correctAnswer": "1-A, 2-B",
                "marks": 2.0
            },
            {
                "id": "q3",
                "text": "Order the steps.",
                "type": "ordering",
                "orderedItems": ["Mix", "Bake", "Cool"],
                "options": ["stray"],
                "correctAnswer": "Mix, Bake, Cool",
                "explanation": "Recipe order.",
                "marks": 3,
                "sourceReference": "Cookbook p.4"
            }
        ]
    }"#;

    #[test]
    fn parses_clean_json() {
        let exam = parse_exam(EXAM_JSON).unwrap();
        assert_eq!(exam.title, "Cell Biology");
        assert_eq!(exam.questions.len(), 3);
        assert_eq!(exam.questions[1].marks, 2);
        assert_eq!(
            exam.questions[2].kind,
            QuestionKind::Ordering {
                items: vec!["Mix".into(), "Bake".into(), "Cool".into()]
            }
        );
        assert_eq!(exam.questions[1].explanation, "");
        assert!(exam.created_at.is_none());
    }

    #[test]
    fn falls_back_to_outermost_braces_when_wrapped_in_prose() {
        let wrapped = format!("Here is your exam:\n```json\n{}\n```\nGood luck!", EXAM_JSON);
        let exam = parse_exam(&wrapped).unwrap();
        assert_eq!(exam.id, "exam-1");
    }

    #[test]
    fn empty_response_is_rejected() {
        assert_eq!(parse_exam("   \n").unwrap_err(), ExamParseError::Empty);
    }

    #[test]
    fn invalid_span_is_rejected_with_remediation_hint() {
        let err = parse_exam("Sorry { this is not json }").unwrap_err();
        assert!(matches!(err, ExamParseError::Unparsable(_)));
        assert!(err.user_message().ends_with(REMEDIATION_HINT));

        let no_braces = parse_exam("I could not do that.").unwrap_err();
        assert!(matches!(no_braces, ExamParseError::Unparsable(_)));
    }

    #[test]
    fn missing_type_field_is_a_shape_error() {
        let json = EXAM_JSON.replace(r#""options": ["Paris", "Rome", "Berlin", "Madrid"],"#, "");
        let err = parse_exam(&json).unwrap_err();
        assert_eq!(
            err,
            ExamParseError::Shape(ResponseShapeError::MissingTypeField {
                question: "q1".to_string(),
                question_type: QuestionType::MultipleChoice,
                field: "options",
            })
        );
    }

    #[test]
    fn fractional_marks_are_rejected() {
        let json = EXAM_JSON.replace(r#""marks": 3,"#, r#""marks": 2.5,"#);
        assert!(matches!(
            parse_exam(&json),
            Err(ExamParseError::Shape(ResponseShapeError::NotAWholeNumber { .. }))
        ));
    }

    #[test]
    fn exam_without_questions_is_rejected() {
        let json = r#"{"id":"e","title":"t","description":"d","durationMinutes":10,"totalMarks":0,"questions":[]}"#;
        assert_eq!(
            parse_exam(json).unwrap_err(),
            ExamParseError::Shape(ResponseShapeError::NoQuestions)
        );
    }

    #[test]
    fn missing_duration_defaults_to_zero() {
        let json = r#"{"id":"e","title":"t","description":"d","totalMarks":1,
            "questions":[{"id":"q1","text":"Discuss.","type":"essay","correctAnswer":"Anything","marks":1}]}"#;
        let exam = parse_exam(json).unwrap();
        assert_eq!(exam.duration_minutes, 0);
        assert_eq!(exam.questions.len(), 1);
    }

    #[test]
    fn huge_marks_do_not_overflow_the_sum_check() {
        let json = r#"{"id":"e","title":"t","description":"d","totalMarks":1,
            "questions":[
                {"id":"q1","text":"a","type":"essay","correctAnswer":"x","marks":4294967295},
                {"id":"q2","text":"b","type":"essay","correctAnswer":"y","marks":2}
            ]}"#;
        let exam = parse_exam(json).unwrap();
        assert_eq!(exam.question_marks_sum(), u64::from(u32::MAX) + 2);
        assert_eq!(exam.total_marks, 1);
    }

    #[test]
    fn mismatched_total_is_trusted() {
        let json = EXAM_JSON.replace(r#""totalMarks": 6"#, r#""totalMarks": 100"#);
        assert_eq!(parse_exam(&json).unwrap().total_marks, 100);
    }

    #[test]
    fn stray_fields_are_dropped_on_round_trip() {
        let exam = parse_exam(EXAM_JSON).unwrap();
        let json = serde_json::to_value(&exam).unwrap();
        assert!(json["questions"][2].get("options").is_none());
        assert_eq!(json["questions"][1]["marks"], 2);

        let reloaded: Exam = serde_json::from_value(json).unwrap();
        assert_eq!(reloaded, exam);
    }

    #[test]
    fn analysis_outcome_collapses_failures() {
        assert_eq!(analysis_outcome::<String>(Ok("Key ideas".into())), "Key ideas");
        assert_eq!(analysis_outcome::<String>(Ok("  ".into())), ANALYSIS_UNAVAILABLE);
        assert_eq!(analysis_outcome::<String>(Err("timeout".into())), ANALYSIS_FAILED);
    }
}
