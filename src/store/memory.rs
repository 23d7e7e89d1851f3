// src/store/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Store, stale_room};
use crate::{
    error::AppError,
    models::{
        answer::{Answer, NewAnswer},
        participant::Participant,
        quiz::{Question, Quiz},
        room::{NewRoom, Room, RoomStatus},
        user::User,
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    quizzes: Vec<Quiz>,
    rooms: Vec<Room>,
    participants: Vec<Participant>,
    answers: Vec<Answer>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Used when no database is configured and by the test suite.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str, role: &str) -> Result<User, AppError> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!("Username '{}' already exists", username)));
        }
        let user = User {
            id: t.next_id(),
            username: username.to_string(),
            password: password_hash.to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_quiz(&self, teacher_id: i64, title: &str, questions: &[Question]) -> Result<Quiz, AppError> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let quiz = Quiz {
            id: t.next_id(),
            teacher_id,
            title: title.to_string(),
            questions: questions.to_vec(),
            created_at: now,
            updated_at: now,
        };
        t.quizzes.push(quiz.clone());
        Ok(quiz)
    }

    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        let t = self.tables.read().await;
        Ok(t.quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn list_quizzes(&self, teacher_id: i64) -> Result<Vec<Quiz>, AppError> {
        let t = self.tables.read().await;
        let mut quizzes: Vec<Quiz> = t
            .quizzes
            .iter()
            .filter(|q| q.teacher_id == teacher_id)
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(quizzes)
    }

    async fn update_quiz(&self, id: i64, title: &str, questions: &[Question]) -> Result<Option<Quiz>, AppError> {
        let mut t = self.tables.write().await;
        let Some(quiz) = t.quizzes.iter_mut().find(|q| q.id == id) else {
            return Ok(None);
        };
        quiz.title = title.to_string();
        quiz.questions = questions.to_vec();
        quiz.updated_at = Utc::now();
        Ok(Some(quiz.clone()))
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.tables.write().await;
        if t.rooms.iter().any(|r| r.quiz_id == id) {
            return Err(AppError::Conflict("Quiz is used by a room".to_string()));
        }
        let before = t.quizzes.len();
        t.quizzes.retain(|q| q.id != id);
        Ok(t.quizzes.len() != before)
    }

    async fn quiz_has_open_room(&self, quiz_id: i64) -> Result<bool, AppError> {
        let t = self.tables.read().await;
        Ok(t.rooms
            .iter()
            .any(|r| r.quiz_id == quiz_id && r.status != RoomStatus::Completed))
    }

    async fn create_room(&self, room: NewRoom) -> Result<Room, AppError> {
        let mut t = self.tables.write().await;
        if t.rooms.iter().any(|r| r.code == room.code) {
            return Err(AppError::Conflict(format!("Room code '{}' is taken", room.code)));
        }
        if !t.quizzes.iter().any(|q| q.id == room.quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        let room = Room {
            id: t.next_id(),
            code: room.code,
            quiz_id: room.quiz_id,
            teacher_id: room.teacher_id,
            status: RoomStatus::Waiting,
            current_question_index: 0,
            control_mode: room.control_mode,
            started_at: None,
            ended_at: None,
            question_started_at: None,
            created_at: Utc::now(),
            version: 1,
        };
        t.rooms.push(room.clone());
        Ok(room)
    }

    async fn get_room(&self, id: i64) -> Result<Option<Room>, AppError> {
        let t = self.tables.read().await;
        Ok(t.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn find_room_by_code(&self, code: &str) -> Result<Option<Room>, AppError> {
        let t = self.tables.read().await;
        Ok(t.rooms.iter().find(|r| r.code == code).cloned())
    }

    async fn save_room(&self, room: &Room) -> Result<Room, AppError> {
        let mut t = self.tables.write().await;
        let stored = t
            .rooms
            .iter_mut()
            .find(|r| r.id == room.id && r.version == room.version)
            .ok_or_else(|| stale_room(room.id))?;
        *stored = Room {
            version: room.version + 1,
            ..room.clone()
        };
        Ok(stored.clone())
    }

    async fn add_participant(&self, room_id: i64, student_name: &str) -> Result<Participant, AppError> {
        let mut t = self.tables.write().await;
        if !t.rooms.iter().any(|r| r.id == room_id) {
            return Err(AppError::NotFound("Room not found".to_string()));
        }
        let participant = Participant {
            id: t.next_id(),
            room_id,
            student_name: student_name.to_string(),
            is_active: true,
            joined_at: Utc::now(),
        };
        t.participants.push(participant.clone());
        Ok(participant)
    }

    async fn get_participant(&self, id: i64) -> Result<Option<Participant>, AppError> {
        let t = self.tables.read().await;
        Ok(t.participants.iter().find(|p| p.id == id).cloned())
    }

    async fn list_participants(&self, room_id: i64) -> Result<Vec<Participant>, AppError> {
        let t = self.tables.read().await;
        Ok(t.participants
            .iter()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn set_participant_active(&self, id: i64, is_active: bool) -> Result<Option<Participant>, AppError> {
        let mut t = self.tables.write().await;
        Ok(t.participants.iter_mut().find(|p| p.id == id).map(|p| {
            p.is_active = is_active;
            p.clone()
        }))
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer, AppError> {
        let mut t = self.tables.write().await;
        if t.answers.iter().any(|a| {
            a.participant_id == answer.participant_id && a.question_index == answer.question_index
        }) {
            return Err(AppError::Conflict("Question already answered".to_string()));
        }
        let answer = Answer {
            id: t.next_id(),
            room_id: answer.room_id,
            participant_id: answer.participant_id,
            question_index: answer.question_index,
            answer: answer.answer,
            is_correct: answer.is_correct,
            score: answer.score,
            time_taken_ms: answer.time_taken_ms,
            answered_at: Utc::now(),
        };
        t.answers.push(answer.clone());
        Ok(answer)
    }

    async fn list_answers(&self, room_id: i64) -> Result<Vec<Answer>, AppError> {
        let t = self.tables.read().await;
        Ok(t.answers
            .iter()
            .filter(|a| a.room_id == room_id)
            .cloned()
            .collect())
    }
}
