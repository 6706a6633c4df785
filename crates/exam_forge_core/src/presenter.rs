//! crates/exam_forge_core/src/presenter.rs
//!
//! Read-only exam view with a single reveal flag.
//!
//! Matching and ordering items are shown in a random order so the layout never
//! gives the answer away. The order comes from a seed chosen per render; the
//! canonical order stored in the exam is never touched.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::domain::{Exam, MatchingPair, Question, QuestionKind};
use crate::shuffle::{permutation, render_rng, shuffled};

pub const FILL_BLANK_HINT: &str = "Write your answer in the space provided above.";

/// `A`, `B`, ... `Z`, `AA`, `AB`, ...
pub fn letter_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

pub fn marks_label(marks: u32) -> String {
    if marks == 1 {
        "1 Mark".to_string()
    } else {
        format!("{} Marks", marks)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelledItem {
    pub label: String,
    pub text: String,
}

//=========================================================================================
// Matching layout
//=========================================================================================

/// Two columns for a matching question. Column A is numbered in canonical
/// order; column B is lettered by display position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingLayout {
    pub column_a: Vec<LabelledItem>,
    pub column_b: Vec<LabelledItem>,
    /// `{number}-{letter}` for every left item, in canonical order.
    pub key: Vec<String>,
}

impl MatchingLayout {
    /// Right column in canonical order, so the key reads `1-A, 2-B, ...`.
    pub fn canonical(pairs: &[MatchingPair]) -> Self {
        Self::with_order(pairs, (0..pairs.len()).collect())
    }

    pub fn shuffled<R: Rng + ?Sized>(pairs: &[MatchingPair], rng: &mut R) -> Self {
        Self::with_order(pairs, permutation(pairs.len(), rng))
    }

    /// `order[p]` is the canonical index of the pair whose right item is shown at position `p`.
    fn with_order(pairs: &[MatchingPair], order: Vec<usize>) -> Self {
        let column_a = pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| LabelledItem {
                label: (i + 1).to_string(),
                text: pair.left.clone(),
            })
            .collect();

        let column_b = order
            .iter()
            .enumerate()
            .map(|(position, &canonical)| LabelledItem {
                label: letter_label(position),
                text: pairs[canonical].right.clone(),
            })
            .collect();

        let mut display_position = vec![0; pairs.len()];
        for (position, &canonical) in order.iter().enumerate() {
            display_position[canonical] = position;
        }
        let key = display_position
            .iter()
            .enumerate()
            .map(|(i, &position)| format!("{}-{}", i + 1, letter_label(position)))
            .collect();

        Self {
            column_a,
            column_b,
            key,
        }
    }

    pub fn key_line(&self) -> String {
        self.key.join(", ")
    }
}

//=========================================================================================
// View model
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionBody {
    Choices { options: Vec<LabelledItem> },
    Matching {
        column_a: Vec<LabelledItem>,
        column_b: Vec<LabelledItem>,
    },
    Ordering { items: Vec<String> },
    FillBlank { hint: String },
    Written,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSolution {
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_sequence: Option<Vec<String>>,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedQuestion {
    pub number: usize,
    pub id: String,
    pub type_label: String,
    pub marks_label: String,
    pub text: String,
    pub body: QuestionBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<RenderedSolution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedExam {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    pub total_marks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub revealed: bool,
    pub questions: Vec<RenderedQuestion>,
}

//=========================================================================================
// Presenter
//=========================================================================================

#[derive(Debug, Clone)]
pub struct ExamPresenter {
    exam: Exam,
    revealed: bool,
}

impl ExamPresenter {
    /// Solutions start hidden.
    pub fn new(exam: Exam) -> Self {
        Self {
            exam,
            revealed: false,
        }
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn toggle_reveal(&mut self) -> bool {
        self.revealed = !self.revealed;
        self.revealed
    }

    /// Renders every question. The same seed always yields the same layout.
    pub fn render(&self, seed: u64) -> RenderedExam {
        let mut rng = render_rng(seed);
        let questions = self
            .exam
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| self.render_question(i + 1, question, &mut rng))
            .collect();

        RenderedExam {
            id: self.exam.id.clone(),
            title: self.exam.title.clone(),
            description: self.exam.description.clone(),
            duration_minutes: self.exam.duration_minutes,
            total_marks: self.exam.total_marks,
            created_at: self.exam.created_at,
            revealed: self.revealed,
            questions,
        }
    }

    fn render_question<R: Rng + ?Sized>(
        &self,
        number: usize,
        question: &Question,
        rng: &mut R,
    ) -> RenderedQuestion {
        let mut matching_key = None;

        let body = match &question.kind {
            QuestionKind::MultipleChoice { options } | QuestionKind::TrueFalse { options } => {
                QuestionBody::Choices {
                    options: options
                        .iter()
                        .enumerate()
                        .map(|(i, option)| LabelledItem {
                            label: letter_label(i),
                            text: option.clone(),
                        })
                        .collect(),
                }
            }
            QuestionKind::Matching { pairs } => {
                let layout = MatchingLayout::shuffled(pairs, rng);
                matching_key = Some(layout.key_line());
                QuestionBody::Matching {
                    column_a: layout.column_a,
                    column_b: layout.column_b,
                }
            }
            QuestionKind::Ordering { items } => QuestionBody::Ordering {
                items: shuffled(items, rng),
            },
            QuestionKind::FillBlank => QuestionBody::FillBlank {
                hint: FILL_BLANK_HINT.to_string(),
            },
            QuestionKind::ShortAnswer | QuestionKind::Essay => QuestionBody::Written,
        };

        let solution = self.revealed.then(|| RenderedSolution {
            correct_answer: question.correct_answer.clone(),
            pairs: matching_key,
            correct_sequence: match &question.kind {
                QuestionKind::Ordering { items } => Some(items.clone()),
                _ => None,
            },
            explanation: question.explanation.clone(),
            source_reference: question.source_reference.clone(),
        });

        RenderedQuestion {
            number,
            id: question.id.clone(),
            type_label: question.question_type().label(),
            marks_label: marks_label(question.marks),
            text: question.text.clone(),
            body,
            solution,
        }
    }
}
