// src/realtime/snapshot.rs

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::feed::{ChangeEvent, ChangeKind, Record};
use crate::{
    error::AppError,
    models::{
        answer::Answer,
        participant::{Participant, PlayerView},
        quiz::{PublicQuestion, Question, Quiz},
        room::{Room, RoomStatus},
    },
    services::{
        leaderboard::{self, StudentResult},
        tally::{self, QuestionTally},
    },
    store::Store,
};

/// Teacher-side view of a room, re-derived after every change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub room: Room,
    pub quiz_title: String,
    pub question_count: usize,
    /// Only while the room is active.
    pub current_question: Option<Question>,
    pub tally: Option<QuestionTally>,
    pub participants: Vec<Participant>,
    pub answers: Vec<Answer>,
    pub leaderboard: Vec<StudentResult>,
}

/// A subscriber's merged copy of one room's rows.
///
/// Merge rules make `apply` idempotent and tolerant of reordering:
/// * room: only a strictly newer `version` replaces the current row;
/// * participant: insert by id; for a known id only `is_active` is merged, and it
///   only goes from true to false (names and join times never change after insert);
/// * answer: rows are immutable, first write wins;
/// * delete: removes the row and remembers the id so a late insert stays dropped.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    room: Room,
    quiz: Quiz,
    participants: BTreeMap<i64, Participant>,
    answers: BTreeMap<i64, Answer>,
    removed_participants: HashSet<i64>,
    removed_answers: HashSet<i64>,
}

impl RoomSnapshot {
    pub fn new(room: Room, quiz: Quiz, participants: Vec<Participant>, answers: Vec<Answer>) -> Self {
        Self {
            room,
            quiz,
            participants: participants.into_iter().map(|p| (p.id, p)).collect(),
            answers: answers.into_iter().map(|a| (a.id, a)).collect(),
            removed_participants: HashSet::new(),
            removed_answers: HashSet::new(),
        }
    }

    /// Reads the authoritative rows. `None` when the room or its quiz is gone.
    pub async fn load(store: &dyn Store, room_id: i64) -> Result<Option<Self>, AppError> {
        let Some(room) = store.get_room(room_id).await? else {
            return Ok(None);
        };
        let Some(quiz) = store.get_quiz(room.quiz_id).await? else {
            return Ok(None);
        };
        let participants = store.list_participants(room_id).await?;
        let answers = store.list_answers(room_id).await?;
        Ok(Some(Self::new(room, quiz, participants, answers)))
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// In join order.
    pub fn participants(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self.participants.values().cloned().collect();
        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
        participants
    }

    pub fn answers(&self) -> Vec<Answer> {
        self.answers.values().cloned().collect()
    }

    pub fn active_participants(&self) -> usize {
        self.participants.values().filter(|p| p.is_active).count()
    }

    /// Merges one change. Returns whether anything visible changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        if event.room_id != self.room.id {
            return false;
        }
        match (&event.record, event.kind) {
            // Rooms are never deleted while subscribers exist.
            (Record::Rooms(_), ChangeKind::Delete) => false,
            (Record::Rooms(room), _) => {
                if room.version <= self.room.version {
                    return false;
                }
                self.room = room.clone();
                true
            }
            (Record::RoomParticipants(p), ChangeKind::Delete) => {
                self.removed_participants.insert(p.id);
                self.participants.remove(&p.id).is_some()
            }
            (Record::RoomParticipants(p), _) => self.merge_participant(p),
            (Record::QuizAnswers(a), ChangeKind::Delete) => {
                self.removed_answers.insert(a.id);
                self.answers.remove(&a.id).is_some()
            }
            (Record::QuizAnswers(a), _) => {
                if self.removed_answers.contains(&a.id) || self.answers.contains_key(&a.id) {
                    return false;
                }
                self.answers.insert(a.id, a.clone());
                true
            }
        }
    }

    fn merge_participant(&mut self, incoming: &Participant) -> bool {
        if self.removed_participants.contains(&incoming.id) {
            return false;
        }
        match self.participants.get_mut(&incoming.id) {
            Some(existing) => {
                let is_active = existing.is_active && incoming.is_active;
                if existing.is_active == is_active {
                    return false;
                }
                existing.is_active = is_active;
                true
            }
            None => {
                self.participants.insert(incoming.id, incoming.clone());
                true
            }
        }
    }

    fn current_question(&self) -> Option<&Question> {
        if self.room.status != RoomStatus::Active {
            return None;
        }
        self.quiz.question(self.room.current_question_index)
    }

    pub fn leaderboard(&self) -> Vec<StudentResult> {
        leaderboard::build(&self.participants(), &self.answers(), self.quiz.question_count())
    }

    pub fn tally(&self) -> Option<QuestionTally> {
        let question = self.current_question()?;
        Some(tally::tally(
            self.room.current_question_index,
            question,
            &self.answers(),
            &self.participants(),
        ))
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard {
            room: self.room.clone(),
            quiz_title: self.quiz.title.clone(),
            question_count: self.quiz.question_count(),
            current_question: self.current_question().cloned(),
            tally: self.tally(),
            participants: self.participants(),
            answers: self.answers(),
            leaderboard: self.leaderboard(),
        }
    }

    /// Student-side view. `None` when the participant is not part of this room.
    pub fn player_view(&self, participant_id: i64) -> Option<PlayerView> {
        let participant = self.participants.get(&participant_id)?.clone();
        let own: Vec<&Answer> = self
            .answers
            .values()
            .filter(|a| a.participant_id == participant_id)
            .collect();
        let index = self.room.current_question_index;
        let current_question = self
            .current_question()
            .map(|q| PublicQuestion::from_question(index, q));

        Some(PlayerView {
            room: self.room.clone(),
            participant,
            question_count: self.quiz.question_count(),
            answered_current: current_question.is_some()
                && own.iter().any(|a| a.question_index == index),
            current_question,
            correct: own.iter().filter(|a| a.is_correct).count(),
            score: own.iter().map(|a| a.score).sum(),
        })
    }
}
