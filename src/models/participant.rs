// src/models/participant.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{quiz::PublicQuestion, room::Room};

/// Width of the `student_name` column, in characters.
pub const MAX_NAME_LENGTH: usize = 40;

/// Represents the 'room_participants' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: i64,
    pub room_id: i64,
    pub student_name: String,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

/// DTO for a student joining with a room code.
#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 4, max = 12, message = "Room code is invalid."))]
    pub code: String,
    #[validate(length(min = 1, max = 40, message = "Name must be between 1 and 40 characters."))]
    pub student_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub participant: Participant,
    pub room_id: i64,
    /// Bearer token for the `/api/play` routes.
    pub token: String,
}

/// What a student sees: the room, the current question and their own progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerView {
    pub room: Room,
    pub participant: Participant,
    pub question_count: usize,
    pub current_question: Option<PublicQuestion>,
    /// Whether this student already answered the current question.
    pub answered_current: bool,
    pub correct: usize,
    pub score: i64,
}
