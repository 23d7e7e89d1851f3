// src/services/grading.rs

use chrono::{DateTime, Utc};

use crate::models::{
    answer::AnswerValue,
    quiz::{Question, QuestionKind},
};

/// Points for a correct answer given at the very last moment.
pub const BASE_POINTS: i64 = 500;
/// Extra points for speed, shrinking linearly to zero at the time limit.
pub const SPEED_BONUS: i64 = 500;
/// Submissions this long after the time limit are still accepted.
pub const ANSWER_GRACE_MS: i64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub is_correct: bool,
    pub score: i64,
}

/// Grades one submission. Mismatched answer kinds and unknown options are incorrect.
pub fn grade(question: &Question, answer: &AnswerValue, time_taken_ms: i64) -> Grade {
    let is_correct = match (&question.kind, answer) {
        (QuestionKind::MultipleChoice { options }, AnswerValue::Choice { selected_option_id }) => {
            options
                .iter()
                .any(|o| o.id == *selected_option_id && o.is_correct)
        }
        (QuestionKind::TextInput { correct_answer }, AnswerValue::Text { text }) => {
            let expected = normalize(correct_answer);
            !expected.is_empty() && normalize(text) == expected
        }
        _ => false,
    };

    let score = if is_correct {
        speed_score(time_taken_ms, question.time_limit)
    } else {
        0
    };

    Grade { is_correct, score }
}

/// 1000 for an instant answer down to 500 at the time limit.
pub fn speed_score(time_taken_ms: i64, time_limit_secs: u32) -> i64 {
    let limit_ms = i64::from(time_limit_secs.max(1)) * 1000;
    let taken = time_taken_ms.clamp(0, limit_ms);
    let remaining = 1.0 - taken as f64 / limit_ms as f64;
    BASE_POINTS + (SPEED_BONUS as f64 * remaining).round() as i64
}

/// Milliseconds between the question being shown and `now`, never negative.
pub fn elapsed_ms(question_started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    question_started_at
        .map(|started| (now - started).num_milliseconds().max(0))
        .unwrap_or(0)
}

/// Trims, collapses inner whitespace and lowercases.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
