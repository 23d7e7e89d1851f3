// src/handlers/play.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        answer::{NewAnswer, SubmitAnswerRequest, SubmitAnswerResponse},
        participant::{JoinRequest, JoinResponse, MAX_NAME_LENGTH, Participant},
        room::RoomStatus,
        user::STUDENT_ROLE,
    },
    realtime::{ChangeEvent, ChangeKind, RoomSnapshot},
    services::grading::{self, ANSWER_GRACE_MS},
    state::AppState,
    utils::{code::normalize_room_code, html::clean_text, jwt::{Claims, sign_jwt}},
};

async fn current_participant(state: &AppState, claims: &Claims) -> Result<Participant, AppError> {
    state
        .store
        .get_participant(claims.subject_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))
}

/// Joins a room by its code and hands out a student token.
pub async fn join_room(
    State(state): State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let not_found = || AppError::NotFound("Room not found".to_string());
    let code = normalize_room_code(&payload.code).ok_or_else(not_found)?;
    let room = state
        .store
        .find_room_by_code(&code)
        .await?
        .ok_or_else(not_found)?;

    if room.is_completed() {
        return Err(AppError::BadRequest("This quiz has already ended".to_string()));
    }

    let student_name = clean_text(&payload.student_name);
    let name_length = student_name.chars().count();
    if name_length == 0 || name_length > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(
            "Name must be between 1 and 40 characters.".to_string(),
        ));
    }

    let participant = state.store.add_participant(room.id, &student_name).await?;
    state
        .feed
        .publish(ChangeEvent::participant(ChangeKind::Insert, &participant));

    tracing::info!("Participant {} joined room {}", participant.id, room.id);

    let token = sign_jwt(
        participant.id,
        STUDENT_ROLE,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(JoinResponse {
            participant,
            room_id: room.id,
            token,
        }),
    ))
}

/// The student's view of their room.
pub async fn get_play_state(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let participant = current_participant(&state, &claims).await?;
    let view = RoomSnapshot::load(state.store.as_ref(), participant.room_id)
        .await?
        .and_then(|snapshot| snapshot.player_view(participant.id))
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;
    Ok(Json(view))
}

/// Grades and stores an answer to the open question.
///
/// Time taken is measured from when the question was shown. Answers for
/// another question, after the time limit, or a second answer are rejected.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let participant = current_participant(&state, &claims).await?;
    if !participant.is_active {
        return Err(AppError::Forbidden("You have left this room".to_string()));
    }

    let room = state
        .store
        .get_room(participant.room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    if room.status != RoomStatus::Active {
        return Err(AppError::BadRequest("The quiz is not running".to_string()));
    }
    if payload.question_index != room.current_question_index {
        return Err(AppError::BadRequest("This question is closed".to_string()));
    }

    let quiz = state
        .store
        .get_quiz(room.quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
    let question = quiz
        .question(room.current_question_index)
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    let limit_ms = i64::from(question.time_limit) * 1000;
    let elapsed = grading::elapsed_ms(room.question_started_at, Utc::now());
    if elapsed > limit_ms + ANSWER_GRACE_MS {
        return Err(AppError::BadRequest("Time is up".to_string()));
    }
    let time_taken_ms = elapsed.min(limit_ms);

    let grade = grading::grade(question, &payload.answer, time_taken_ms);

    let answer = state
        .store
        .insert_answer(NewAnswer {
            room_id: room.id,
            participant_id: participant.id,
            question_index: payload.question_index,
            answer: payload.answer,
            is_correct: grade.is_correct,
            score: grade.score,
            time_taken_ms,
        })
        .await?;
    state.feed.publish(ChangeEvent::answer(&answer));

    tracing::debug!(
        "Participant {} answered question {} in room {} (correct={})",
        participant.id,
        answer.question_index,
        room.id,
        answer.is_correct
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitAnswerResponse {
            is_correct: answer.is_correct,
            score: answer.score,
            time_taken_ms: answer.time_taken_ms,
        }),
    ))
}

/// Marks the student inactive. Their answers stay in the results.
pub async fn leave_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let participant = current_participant(&state, &claims).await?;
    if !participant.is_active {
        return Ok(StatusCode::NO_CONTENT);
    }

    if let Some(updated) = state.store.set_participant_active(participant.id, false).await? {
        state
            .feed
            .publish(ChangeEvent::participant(ChangeKind::Update, &updated));
        tracing::info!("Participant {} left room {}", updated.id, updated.room_id);
    }

    Ok(StatusCode::NO_CONTENT)
}
