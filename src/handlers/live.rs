// src/handlers/live.rs

use std::convert::Infallible;

use axum::{
    Extension,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, stream};

use crate::{
    error::AppError,
    realtime::{RoomSnapshot, RoomSubscription},
    state::AppState,
    utils::jwt::Claims,
};

/// Which derived view a subscriber receives.
#[derive(Debug, Clone, Copy)]
enum View {
    Dashboard,
    Player(i64),
}

impl View {
    fn render(&self, snapshot: &RoomSnapshot) -> Option<Event> {
        let event = match self {
            View::Dashboard => Event::default()
                .event("dashboard")
                .json_data(snapshot.dashboard()),
            View::Player(participant_id) => Event::default()
                .event("player")
                .json_data(snapshot.player_view(*participant_id)?),
        };
        event
            .map_err(|e| tracing::error!("Failed to encode live view: {}", e))
            .ok()
    }
}

/// The initial view, then one event per change that alters the snapshot.
fn live_stream(
    subscription: RoomSubscription,
    view: View,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold((subscription, false), move |(mut subscription, primed)| async move {
        if primed && !subscription.next_change().await {
            return None;
        }
        let event = view.render(subscription.snapshot())?;
        Some((Ok(event), (subscription, true)))
    })
}

async fn open_subscription(state: &AppState, room_id: i64) -> Result<RoomSubscription, AppError> {
    RoomSubscription::open(state.store.clone(), &state.feed, room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))
}

/// Teacher dashboard stream: a `dashboard` event now and after every change.
pub async fn room_live(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let subscription = open_subscription(&state, id).await?;
    if subscription.snapshot().room().teacher_id != claims.subject_id()? {
        return Err(AppError::Forbidden("This room belongs to another teacher".to_string()));
    }

    tracing::debug!("Teacher live view opened for room {}", id);

    Ok(Sse::new(live_stream(subscription, View::Dashboard)).keep_alive(KeepAlive::default()))
}

/// Student stream: a `player` event now and after every change to their room.
pub async fn play_live(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let participant = state
        .store
        .get_participant(claims.subject_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;

    let subscription = open_subscription(&state, participant.room_id).await?;
    let view = View::Player(participant.id);

    Ok(Sse::new(live_stream(subscription, view)).keep_alive(KeepAlive::default()))
}
