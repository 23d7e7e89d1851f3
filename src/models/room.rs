// src/models/room.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Manual,
    Auto,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Active => "active",
            RoomStatus::Completed => "completed",
        }
    }
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::Manual => "manual",
            ControlMode::Auto => "auto",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(RoomStatus::Waiting),
            "active" => Ok(RoomStatus::Active),
            "completed" => Ok(RoomStatus::Completed),
            other => Err(format!("unknown room status '{}'", other)),
        }
    }
}

impl FromStr for ControlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ControlMode::Manual),
            "auto" => Ok(ControlMode::Auto),
            other => Err(format!("unknown control mode '{}'", other)),
        }
    }
}

/// Represents the 'rooms' table: one live session of a quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: i64,
    pub code: String,
    pub quiz_id: i64,
    pub teacher_id: i64,
    pub status: RoomStatus,
    pub current_question_index: i32,
    pub control_mode: ControlMode,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// When the current question was shown; answer timing is measured from here.
    pub question_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Bumped by the store on every update. Subscribers drop anything not newer.
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Start,
    Advance,
    End,
}

/// Facts about the room's surroundings a transition depends on.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
    pub question_count: usize,
    pub active_participants: usize,
    pub now: DateTime<Utc>,
}

impl Room {
    pub fn is_completed(&self) -> bool {
        self.status == RoomStatus::Completed
    }

    /// Returns the next state of the room, or `None` when the transition does not apply.
    pub fn apply(&self, transition: Transition, ctx: &TransitionContext) -> Option<Room> {
        match transition {
            Transition::Start => self.start(ctx),
            Transition::Advance => self.advance(ctx),
            Transition::End => self.end(ctx.now),
        }
    }

    /// waiting -> active. Needs at least one active participant and one question.
    pub fn start(&self, ctx: &TransitionContext) -> Option<Room> {
        if self.status != RoomStatus::Waiting
            || ctx.active_participants == 0
            || ctx.question_count == 0
        {
            return None;
        }
        Some(Room {
            status: RoomStatus::Active,
            current_question_index: 0,
            started_at: Some(ctx.now),
            question_started_at: Some(ctx.now),
            ..self.clone()
        })
    }

    /// Moves to the next question, or completes the room after the last one.
    pub fn advance(&self, ctx: &TransitionContext) -> Option<Room> {
        if self.status != RoomStatus::Active {
            return None;
        }
        let next = usize::try_from(self.current_question_index + 1).unwrap_or(0);
        if next >= ctx.question_count {
            return self.end(ctx.now);
        }
        Some(Room {
            current_question_index: self.current_question_index + 1,
            question_started_at: Some(ctx.now),
            ..self.clone()
        })
    }

    /// active -> completed.
    pub fn end(&self, now: DateTime<Utc>) -> Option<Room> {
        if self.status != RoomStatus::Active {
            return None;
        }
        Some(Room {
            status: RoomStatus::Completed,
            ended_at: Some(now),
            ..self.clone()
        })
    }
}

/// Insert payload for a new room.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub code: String,
    pub quiz_id: i64,
    pub teacher_id: i64,
    pub control_mode: ControlMode,
}

/// DTO for opening a room.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(range(min = 1))]
    pub quiz_id: i64,
    #[serde(default)]
    pub control_mode: ControlMode,
}

/// Result of a lifecycle call. `changed` is false when the call was a no-op.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub room: Room,
    pub changed: bool,
}

/// Public view of a room for the join screen.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomLookup {
    pub id: i64,
    pub code: String,
    pub status: RoomStatus,
    pub quiz_title: String,
    pub question_count: usize,
}
