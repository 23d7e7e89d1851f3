// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the 'quiz_answers' table. Rows are immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub id: i64,
    pub room_id: i64,
    pub participant_id: i64,
    pub question_index: i32,
    pub answer: AnswerValue,
    pub is_correct: bool,
    pub score: i64,
    pub time_taken_ms: i64,
    pub answered_at: DateTime<Utc>,
}

/// The submitted value, stored as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerValue {
    Choice { selected_option_id: Uuid },
    Text { text: String },
}

impl AnswerValue {
    pub fn selected_option(&self) -> Option<Uuid> {
        match self {
            AnswerValue::Choice { selected_option_id } => Some(*selected_option_id),
            AnswerValue::Text { .. } => None,
        }
    }
}

/// Insert payload for a graded answer.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub room_id: i64,
    pub participant_id: i64,
    pub question_index: i32,
    pub answer: AnswerValue,
    pub is_correct: bool,
    pub score: i64,
    pub time_taken_ms: i64,
}

/// DTO for a student submission.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_index: i32,
    pub answer: AnswerValue,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    pub score: i64,
    pub time_taken_ms: i64,
}
