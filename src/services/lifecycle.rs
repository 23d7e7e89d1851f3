// src/services/lifecycle.rs

use chrono::Utc;

use super::autopilot;
use crate::{
    error::AppError,
    models::room::{ControlMode, Room, RoomStatus, Transition, TransitionContext, TransitionResponse},
    realtime::{ChangeEvent, ChangeKind},
    state::AppState,
};

/// Applies a lifecycle transition to a loaded room.
///
/// Transitions that do not apply (wrong status, nobody joined, already completed)
/// return the room unchanged with `changed: false`. A successful transition is
/// persisted, published on the change feed and, in auto mode, schedules the
/// next auto-advance.
pub async fn transition(
    state: &AppState,
    room: Room,
    transition: Transition,
) -> Result<TransitionResponse, AppError> {
    let quiz = state
        .store
        .get_quiz(room.quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
    let participants = state.store.list_participants(room.id).await?;

    let ctx = TransitionContext {
        question_count: quiz.question_count(),
        active_participants: participants.iter().filter(|p| p.is_active).count(),
        now: Utc::now(),
    };

    let Some(next) = room.apply(transition, &ctx) else {
        tracing::debug!(
            "Room {} ignored {:?} in status {}",
            room.id,
            transition,
            room.status
        );
        return Ok(TransitionResponse {
            room,
            changed: false,
        });
    };

    let saved = state.store.save_room(&next).await?;
    tracing::info!(
        "Room {} {:?}: status={} question={}/{}",
        saved.id,
        transition,
        saved.status,
        saved.current_question_index + 1,
        ctx.question_count
    );

    state.feed.publish(ChangeEvent::room(ChangeKind::Update, &saved));

    if saved.control_mode == ControlMode::Auto && saved.status == RoomStatus::Active {
        autopilot::schedule(state.clone(), &saved, &quiz);
    }

    Ok(TransitionResponse {
        room: saved,
        changed: true,
    })
}

