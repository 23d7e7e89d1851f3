// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};

use super::{Store, stale_room};
use crate::{
    error::AppError,
    models::{
        answer::{Answer, AnswerValue, NewAnswer},
        participant::Participant,
        quiz::{Question, Quiz},
        room::{NewRoom, Room},
        user::User,
    },
};

const ROOM_COLUMNS: &str = "id, code, quiz_id, teacher_id, status, current_question_index, \
     control_mode, started_at, ended_at, question_started_at, created_at, version";

const ANSWER_COLUMNS: &str = "id, room_id, participant_id, question_index, answer, is_correct, \
     score, time_taken_ms, answered_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct QuizRow {
    id: i64,
    teacher_id: i64,
    title: String,
    questions: Json<Vec<Question>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Quiz {
            id: row.id,
            teacher_id: row.teacher_id,
            title: row.title,
            questions: row.questions.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Status and control mode are TEXT columns, parsed on the way out.
#[derive(FromRow)]
struct RoomRow {
    id: i64,
    code: String,
    quiz_id: i64,
    teacher_id: i64,
    status: String,
    current_question_index: i32,
    control_mode: String,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    question_started_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<RoomRow> for Room {
    type Error = AppError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Room {
            id: row.id,
            code: row.code,
            quiz_id: row.quiz_id,
            teacher_id: row.teacher_id,
            status: row.status.parse().map_err(AppError::InternalServerError)?,
            current_question_index: row.current_question_index,
            control_mode: row.control_mode.parse().map_err(AppError::InternalServerError)?,
            started_at: row.started_at,
            ended_at: row.ended_at,
            question_started_at: row.question_started_at,
            created_at: row.created_at,
            version: row.version,
        })
    }
}

#[derive(FromRow)]
struct AnswerRow {
    id: i64,
    room_id: i64,
    participant_id: i64,
    question_index: i32,
    answer: Json<AnswerValue>,
    is_correct: bool,
    score: i64,
    time_taken_ms: i64,
    answered_at: DateTime<Utc>,
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: row.id,
            room_id: row.room_id,
            participant_id: row.participant_id,
            question_index: row.question_index,
            answer: row.answer.0,
            is_correct: row.is_correct,
            score: row.score,
            time_taken_ms: row.time_taken_ms,
            answered_at: row.answered_at,
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str, role: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!("Username '{}' already exists", username)),
            other => other,
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_quiz(&self, teacher_id: i64, title: &str, questions: &[Question]) -> Result<Quiz, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            INSERT INTO quizzes (teacher_id, title, questions)
            VALUES ($1, $2, $3)
            RETURNING id, teacher_id, title, questions, created_at, updated_at
            "#,
        )
        .bind(teacher_id)
        .bind(title)
        .bind(Json(questions))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT id, teacher_id, title, questions, created_at, updated_at FROM quizzes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Quiz::from))
    }

    async fn list_quizzes(&self, teacher_id: i64) -> Result<Vec<Quiz>, AppError> {
        let rows = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, teacher_id, title, questions, created_at, updated_at
            FROM quizzes
            WHERE teacher_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Quiz::from).collect())
    }

    async fn update_quiz(&self, id: i64, title: &str, questions: &[Question]) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            UPDATE quizzes
            SET title = $2, questions = $3, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING id, teacher_id, title, questions, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(Json(questions))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Quiz::from))
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict("Quiz is used by a room".to_string()),
                other => other,
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn quiz_has_open_room(&self, quiz_id: i64) -> Result<bool, AppError> {
        let open = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM rooms WHERE quiz_id = $1 AND status <> 'completed')",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(open)
    }

    async fn create_room(&self, room: NewRoom) -> Result<Room, AppError> {
        let query = format!(
            r#"
            INSERT INTO rooms (code, quiz_id, teacher_id, control_mode)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ROOM_COLUMNS
        );
        let row = sqlx::query_as::<_, RoomRow>(&query)
            .bind(&room.code)
            .bind(room.quiz_id)
            .bind(room.teacher_id)
            .bind(room.control_mode.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict(format!("Room code '{}' is taken", room.code)),
                other => other,
            })?;
        row.try_into()
    }

    async fn get_room(&self, id: i64) -> Result<Option<Room>, AppError> {
        let query = format!("SELECT {} FROM rooms WHERE id = $1", ROOM_COLUMNS);
        sqlx::query_as::<_, RoomRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Room::try_from)
            .transpose()
    }

    async fn find_room_by_code(&self, code: &str) -> Result<Option<Room>, AppError> {
        let query = format!("SELECT {} FROM rooms WHERE code = $1", ROOM_COLUMNS);
        sqlx::query_as::<_, RoomRow>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .map(Room::try_from)
            .transpose()
    }

    async fn save_room(&self, room: &Room) -> Result<Room, AppError> {
        let query = format!(
            r#"
            UPDATE rooms
            SET status = $3,
                current_question_index = $4,
                control_mode = $5,
                started_at = $6,
                ended_at = $7,
                question_started_at = $8,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            ROOM_COLUMNS
        );
        sqlx::query_as::<_, RoomRow>(&query)
            .bind(room.id)
            .bind(room.version)
            .bind(room.status.as_str())
            .bind(room.current_question_index)
            .bind(room.control_mode.as_str())
            .bind(room.started_at)
            .bind(room.ended_at)
            .bind(room.question_started_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| stale_room(room.id))?
            .try_into()
    }

    async fn add_participant(&self, room_id: i64, student_name: &str) -> Result<Participant, AppError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO room_participants (room_id, student_name)
            VALUES ($1, $2)
            RETURNING id, room_id, student_name, is_active, joined_at
            "#,
        )
        .bind(room_id)
        .bind(student_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(participant)
    }

    async fn get_participant(&self, id: i64) -> Result<Option<Participant>, AppError> {
        let participant = sqlx::query_as::<_, Participant>(
            "SELECT id, room_id, student_name, is_active, joined_at FROM room_participants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }

    async fn list_participants(&self, room_id: i64) -> Result<Vec<Participant>, AppError> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, room_id, student_name, is_active, joined_at
            FROM room_participants
            WHERE room_id = $1
            ORDER BY joined_at, id
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(participants)
    }

    async fn set_participant_active(&self, id: i64, is_active: bool) -> Result<Option<Participant>, AppError> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE room_participants SET is_active = $2
            WHERE id = $1
            RETURNING id, room_id, student_name, is_active, joined_at
            "#,
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer, AppError> {
        let query = format!(
            r#"
            INSERT INTO quiz_answers
                (room_id, participant_id, question_index, answer, is_correct, score, time_taken_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ANSWER_COLUMNS
        );
        let row = sqlx::query_as::<_, AnswerRow>(&query)
            .bind(answer.room_id)
            .bind(answer.participant_id)
            .bind(answer.question_index)
            .bind(Json(&answer.answer))
            .bind(answer.is_correct)
            .bind(answer.score)
            .bind(answer.time_taken_ms)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict("Question already answered".to_string()),
                other => other,
            })?;
        Ok(row.into())
    }

    async fn list_answers(&self, room_id: i64) -> Result<Vec<Answer>, AppError> {
        let query = format!(
            "SELECT {} FROM quiz_answers WHERE room_id = $1 ORDER BY answered_at, id",
            ANSWER_COLUMNS
        );
        let rows = sqlx::query_as::<_, AnswerRow>(&query)
            .bind(room_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Answer::from).collect())
    }
}
