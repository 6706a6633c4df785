//! crates/exam_forge_core/src/export.rs
//!
//! Plain-text rendition of an exam for download. Independent of the on-screen
//! reveal flag.

use rand::Rng;
use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;

use crate::domain::{Exam, QuestionKind};
use crate::presenter::{letter_label, MatchingLayout};
use crate::shuffle::shuffled;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is invalid"));

const MATCHING_HEADER: &str = "Column A          | Column B";
const MATCHING_RULE: &str = "------------------|------------------";

/// `Cell Biology 101` becomes `Cell_Biology_101_Exam.txt`.
pub fn export_file_name(title: &str) -> String {
    format!("{}_Exam.txt", WHITESPACE_RUN.replace_all(title, "_"))
}

/// Writes the exam as text.
///
/// With solutions the matching table keeps canonical order so the printed key
/// reads `1-A, 2-B, ...`; without them the right column is shuffled and
/// relettered. Ordering items are always shuffled.
pub fn export_exam<R: Rng + ?Sized>(exam: &Exam, include_solutions: bool, rng: &mut R) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}\n{}\n", exam.title, exam.description);
    let _ = writeln!(
        out,
        "Duration: {} Minutes | Total Marks: {}\n",
        exam.duration_minutes, exam.total_marks
    );

    for (idx, question) in exam.questions.iter().enumerate() {
        let _ = writeln!(
            out,
            "Question {} [{} Marks] ({})",
            idx + 1,
            question.marks,
            question.question_type().label().to_uppercase()
        );
        let _ = writeln!(out, "{}", question.text);

        let mut matching_key = None;
        match &question.kind {
            QuestionKind::MultipleChoice { options } | QuestionKind::TrueFalse { options } => {
                for (i, option) in options.iter().enumerate() {
                    let _ = writeln!(out, "{}) {}", letter_label(i), option);
                }
            }
            QuestionKind::Matching { pairs } => {
                let layout = if include_solutions {
                    MatchingLayout::canonical(pairs)
                } else {
                    MatchingLayout::shuffled(pairs, rng)
                };
                let _ = writeln!(out, "\n{}\n{}", MATCHING_HEADER, MATCHING_RULE);
                for (left, right) in layout.column_a.iter().zip(&layout.column_b) {
                    let _ = writeln!(
                        out,
                        "{}. {:<16} | {}. {}",
                        left.label, left.text, right.label, right.text
                    );
                }
                matching_key = Some(layout.key_line());
            }
            QuestionKind::Ordering { items } => {
                let _ = writeln!(out, "\nItems to order:");
                for item in shuffled(items, rng) {
                    let _ = writeln!(out, "[ ] {}", item);
                }
            }
            QuestionKind::ShortAnswer | QuestionKind::Essay | QuestionKind::FillBlank => {}
        }

        out.push('\n');
        if include_solutions {
            let _ = writeln!(out, "Solution: {}", question.correct_answer);
            if let Some(key) = matching_key {
                let _ = writeln!(out, "Pairs: {}", key);
            }
            if let QuestionKind::Ordering { items } = &question.kind {
                let _ = writeln!(out, "Correct Order: {}", items.join(" → "));
            }
            let _ = writeln!(out, "Explanation: {}\n", question.explanation);
        }
    }

    out
}
