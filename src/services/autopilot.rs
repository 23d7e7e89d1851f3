// src/services/autopilot.rs

use std::time::Duration;

use super::lifecycle;
use crate::{
    error::AppError,
    models::{
        quiz::Quiz,
        room::{Room, RoomStatus, Transition},
    },
    state::AppState,
};

/// Schedules an advance once the current question's time limit has passed.
///
/// The timer only fires if the room is still active on the same question, so
/// a teacher advancing manually in the meantime turns it into a no-op.
pub fn schedule(state: AppState, room: &Room, quiz: &Quiz) {
    let Some(question) = quiz.question(room.current_question_index) else {
        return;
    };
    let delay = Duration::from_secs(u64::from(question.time_limit));
    let room_id = room.id;
    let index = room.current_question_index;

    tracing::debug!("Auto-advance for room {} question {} in {:?}", room_id, index, delay);

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = fire(&state, room_id, index).await {
            tracing::warn!("Auto-advance for room {} failed: {}", room_id, e);
        }
    });
}

async fn fire(state: &AppState, room_id: i64, expected_index: i32) -> Result<(), AppError> {
    let Some(room) = state.store.get_room(room_id).await? else {
        return Ok(());
    };
    if room.status != RoomStatus::Active || room.current_question_index != expected_index {
        return Ok(());
    }
    lifecycle::transition(state, room, Transition::Advance).await?;
    Ok(())
}
