// src/store/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        answer::{Answer, NewAnswer},
        participant::Participant,
        quiz::{Question, Quiz},
        room::{NewRoom, Room},
        user::User,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Row access for every table the service owns.
///
/// Implementations enforce the row-level rules: unique usernames and room codes,
/// one answer per participant and question, and version checks on room updates.
/// All of these surface as `AppError::Conflict`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, username: &str, password_hash: &str, role: &str) -> Result<User, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn create_quiz(&self, teacher_id: i64, title: &str, questions: &[Question]) -> Result<Quiz, AppError>;
    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError>;
    async fn list_quizzes(&self, teacher_id: i64) -> Result<Vec<Quiz>, AppError>;
    /// Replaces title and questions. Returns `None` if the quiz is gone.
    async fn update_quiz(&self, id: i64, title: &str, questions: &[Question]) -> Result<Option<Quiz>, AppError>;
    /// Fails with `Conflict` while rooms still reference the quiz.
    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError>;
    /// Whether a waiting or active room is running the quiz.
    async fn quiz_has_open_room(&self, quiz_id: i64) -> Result<bool, AppError>;

    async fn create_room(&self, room: NewRoom) -> Result<Room, AppError>;
    async fn get_room(&self, id: i64) -> Result<Option<Room>, AppError>;
    async fn find_room_by_code(&self, code: &str) -> Result<Option<Room>, AppError>;
    /// Persists status, index, control mode and timestamps if `room.version`
    /// still matches the stored row, and returns the row with its new version.
    async fn save_room(&self, room: &Room) -> Result<Room, AppError>;

    async fn add_participant(&self, room_id: i64, student_name: &str) -> Result<Participant, AppError>;
    async fn get_participant(&self, id: i64) -> Result<Option<Participant>, AppError>;
    /// Ordered by join time.
    async fn list_participants(&self, room_id: i64) -> Result<Vec<Participant>, AppError>;
    async fn set_participant_active(&self, id: i64, is_active: bool) -> Result<Option<Participant>, AppError>;

    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer, AppError>;
    /// Ordered by answer time.
    async fn list_answers(&self, room_id: i64) -> Result<Vec<Answer>, AppError>;
}

pub(crate) fn stale_room(id: i64) -> AppError {
    AppError::Conflict(format!("Room {} was modified concurrently", id))
}
