// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{AddQuestionRequest, EditOp, Question, Quiz, QuizRequest},
    state::AppState,
    utils::jwt::Claims,
};

/// Loads a quiz and checks it belongs to the calling teacher.
pub(crate) async fn owned_quiz(state: &AppState, id: i64, claims: &Claims) -> Result<Quiz, AppError> {
    let quiz = state
        .store
        .get_quiz(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.teacher_id != claims.subject_id()? {
        return Err(AppError::Forbidden("This quiz belongs to another teacher".to_string()));
    }

    Ok(quiz)
}

/// Like `owned_quiz`, but refuses (409) while a waiting or active room runs the quiz.
/// Open rooms and their answers index into the question list.
async fn editable_quiz(state: &AppState, id: i64, claims: &Claims) -> Result<Quiz, AppError> {
    let quiz = owned_quiz(state, id, claims).await?;

    if state.store.quiz_has_open_room(id).await? {
        return Err(AppError::Conflict(
            "Quiz is being played in an open room".to_string(),
        ));
    }

    Ok(quiz)
}

/// Lists the calling teacher's quizzes, most recently edited first.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = state.store.list_quizzes(claims.subject_id()?).await?;
    Ok(Json(quizzes))
}

/// Creates a quiz. Every question must already satisfy the option rules.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let quiz = state
        .store
        .create_quiz(claims.subject_id()?, payload.title.trim(), &payload.questions)
        .await?;

    tracing::info!("Quiz {} created with {} question(s)", quiz.id, quiz.question_count());

    Ok((StatusCode::CREATED, Json(quiz)))
}

pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = owned_quiz(&state, id, &claims).await?;
    Ok(Json(quiz))
}

/// Replaces title and questions in one go. Refused while a room is open.
pub async fn update_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    editable_quiz(&state, id, &claims).await?;

    let quiz = save(&state, id, payload.title.trim(), &payload.questions).await?;
    Ok(Json(quiz))
}

/// Deletes a quiz. Quizzes that already have rooms are kept (409).
pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    owned_quiz(&state, id, &claims).await?;

    if !state.store.delete_quiz(id).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Appends a question; a blank multiple-choice question when none is given.
pub async fn add_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<AddQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut quiz = editable_quiz(&state, id, &claims).await?;

    let question = payload.question.unwrap_or_else(Question::new_multiple_choice);
    question
        .check()
        .map_err(|e| AppError::BadRequest(format!("Invalid question: {}", e)))?;
    quiz.questions.push(question);

    let quiz = save(&state, id, &quiz.title, &quiz.questions).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Applies one editor operation to the question at `index`.
///
/// Bound violations (a seventh option, dropping below two) are no-ops and
/// report `changed: false` rather than failing.
pub async fn edit_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, index)): Path<(i64, usize)>,
    Json(op): Json<EditOp>,
) -> Result<impl IntoResponse, AppError> {
    let mut quiz = editable_quiz(&state, id, &claims).await?;

    let question = quiz
        .questions
        .get_mut(index)
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    let changed = question.apply(op);
    question
        .check()
        .map_err(|e| AppError::BadRequest(format!("Invalid question: {}", e)))?;
    let question = question.clone();

    if changed {
        save(&state, id, &quiz.title, &quiz.questions).await?;
    }

    Ok(Json(json!({
        "question": question,
        "changed": changed,
    })))
}

pub async fn delete_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, index)): Path<(i64, usize)>,
) -> Result<impl IntoResponse, AppError> {
    let mut quiz = editable_quiz(&state, id, &claims).await?;

    if index >= quiz.questions.len() {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    quiz.questions.remove(index);

    let quiz = save(&state, id, &quiz.title, &quiz.questions).await?;
    Ok(Json(quiz))
}

async fn save(state: &AppState, id: i64, title: &str, questions: &[Question]) -> Result<Quiz, AppError> {
    state
        .store
        .update_quiz(id, title, questions)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}
