// src/routes.rs

use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, live, play, quiz, room},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Public: teacher auth, room lookup by code, joining.
/// * Teacher: quizzes, the question editor, room control, results, live dashboard.
/// * Student: play state, answering, leaving, live player view.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route(
            "/{id}",
            get(quiz::get_quiz)
                .put(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        .route("/{id}/questions", post(quiz::add_question))
        .route(
            "/{id}/questions/{index}",
            patch(quiz::edit_question).delete(quiz::delete_question),
        )
        // Auth first, then the role check
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let room_routes = Router::new()
        .route("/code/{code}", get(room::lookup_room))
        .merge(
            Router::new()
                .route("/", post(room::create_room))
                .route("/{id}", get(room::get_room))
                .route("/{id}/start", post(room::start_room))
                .route("/{id}/advance", post(room::advance_room))
                .route("/{id}/end", post(room::end_room))
                .route("/{id}/tally", get(room::get_tally))
                .route("/{id}/results", get(room::get_results))
                .route("/{id}/results.csv", get(room::export_results))
                .route("/{id}/live", get(live::room_live))
                .layer(middleware::from_fn(teacher_middleware))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let play_routes = Router::new()
        .route("/", get(play::get_play_state))
        .route("/answers", post(play::submit_answer))
        .route("/leave", post(play::leave_room))
        .route("/live", get(live::play_live))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/rooms", room_routes)
        .route("/api/join", post(play::join_room))
        .nest("/api/play", play_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
