// src/handlers/room.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use url::Url;
use validator::Validate;

use crate::{
    error::AppError,
    models::room::{CreateRoomRequest, NewRoom, Room, RoomLookup, Transition, TransitionResponse},
    realtime::RoomSnapshot,
    services::{export, lifecycle},
    state::AppState,
    utils::{
        code::{generate_room_code, normalize_room_code},
        jwt::Claims,
    },
};

use super::quiz::owned_quiz;

const CODE_ATTEMPTS: usize = 10;

fn room_not_found() -> AppError {
    AppError::NotFound("Room not found".to_string())
}

/// Loads a room and checks it belongs to the calling teacher.
async fn owned_room(state: &AppState, id: i64, claims: &Claims) -> Result<Room, AppError> {
    let room = state.store.get_room(id).await?.ok_or_else(room_not_found)?;

    if room.teacher_id != claims.subject_id()? {
        return Err(AppError::Forbidden("This room belongs to another teacher".to_string()));
    }

    Ok(room)
}

/// Same ownership check, returning the full merged snapshot.
pub(crate) async fn owned_snapshot(state: &AppState, id: i64, claims: &Claims) -> Result<RoomSnapshot, AppError> {
    let snapshot = RoomSnapshot::load(state.store.as_ref(), id)
        .await?
        .ok_or_else(room_not_found)?;

    if snapshot.room().teacher_id != claims.subject_id()? {
        return Err(AppError::Forbidden("This room belongs to another teacher".to_string()));
    }

    Ok(snapshot)
}

fn join_url(base: &str, code: &str) -> Result<String, AppError> {
    Url::parse(base)
        .and_then(|base| base.join(&format!("join/{}", code)))
        .map(|url| url.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Invalid PUBLIC_BASE_URL: {}", e)))
}

/// Opens a room for one of the teacher's quizzes under a fresh code.
pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let quiz = owned_quiz(&state, payload.quiz_id, &claims).await?;
    if quiz.question_count() == 0 {
        return Err(AppError::BadRequest("Quiz has no questions".to_string()));
    }

    let mut attempt = 0;
    let room = loop {
        attempt += 1;
        let new_room = NewRoom {
            code: generate_room_code(),
            quiz_id: quiz.id,
            teacher_id: quiz.teacher_id,
            control_mode: payload.control_mode,
        };
        match state.store.create_room(new_room).await {
            Ok(room) => break room,
            Err(AppError::Conflict(msg)) if attempt < CODE_ATTEMPTS => {
                tracing::debug!("Room code collision, retrying: {}", msg);
            }
            Err(e) => return Err(e),
        }
    };

    tracing::info!("Room {} opened with code {} for quiz {}", room.id, room.code, quiz.id);

    let join_url = join_url(&state.config.public_base_url, &room.code)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "room": room,
            "join_url": join_url,
        })),
    ))
}

/// Current dashboard: room, current question, tally, participants and leaderboard.
pub async fn get_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = owned_snapshot(&state, id, &claims).await?;
    Ok(Json(snapshot.dashboard()))
}

pub async fn start_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    run_transition(&state, id, &claims, Transition::Start).await
}

pub async fn advance_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    run_transition(&state, id, &claims, Transition::Advance).await
}

pub async fn end_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    run_transition(&state, id, &claims, Transition::End).await
}

async fn run_transition(
    state: &AppState,
    id: i64,
    claims: &Claims,
    transition: Transition,
) -> Result<Json<TransitionResponse>, AppError> {
    let room = owned_room(state, id, claims).await?;
    let response = lifecycle::transition(state, room, transition).await?;
    Ok(Json(response))
}

/// Per-option counts for the active question. 404 when no question is open.
pub async fn get_tally(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = owned_snapshot(&state, id, &claims).await?;
    let tally = snapshot
        .tally()
        .ok_or_else(|| AppError::NotFound("No question is open".to_string()))?;
    Ok(Json(tally))
}

/// Ranked results for the room.
pub async fn get_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = owned_snapshot(&state, id, &claims).await?;

    Ok(Json(json!({
        "room": snapshot.room(),
        "quiz_title": snapshot.quiz().title,
        "question_count": snapshot.quiz().question_count(),
        "participant_count": snapshot.participants().len(),
        "results": snapshot.leaderboard(),
    })))
}

/// Ranked results as a CSV download.
pub async fn export_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = owned_snapshot(&state, id, &claims).await?;
    let csv = export::to_csv(&snapshot.leaderboard());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::file_name(&snapshot.room().code)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Public lookup for the join screen.
pub async fn lookup_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let code = normalize_room_code(&code).ok_or_else(room_not_found)?;
    let room = state
        .store
        .find_room_by_code(&code)
        .await?
        .ok_or_else(room_not_found)?;
    let quiz = state
        .store
        .get_quiz(room.quiz_id)
        .await?
        .ok_or_else(room_not_found)?;

    Ok(Json(RoomLookup {
        id: room.id,
        code: room.code,
        status: room.status,
        question_count: quiz.question_count(),
        quiz_title: quiz.title,
    }))
}
