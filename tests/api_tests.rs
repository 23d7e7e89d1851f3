// tests/api_tests.rs

use std::sync::Arc;
use std::time::Duration;

use classroom_quiz::{config::Config, routes, state::AppState, store::MemoryStore};
use serde_json::{Value, json};
use uuid::Uuid;

/// Spawns the app on a random port, backed by the in-memory store.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let config = Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        public_base_url: "http://quiz.test".to_string(),
        feed_capacity: 64,
    };

    let state = AppState::new(Arc::new(MemoryStore::new()), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registers and logs in a teacher, returning the bearer token.
async fn teacher_token(client: &reqwest::Client, address: &str, username: &str) -> String {
    let password = "password123";
    let register = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(register.status().as_u16(), 201);

    let login: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

fn mc(text: &str, options: &[(Uuid, &str, bool)]) -> Value {
    json!({
        "text": text,
        "time_limit": 60,
        "type": "multiple-choice",
        "options": options
            .iter()
            .map(|(id, text, correct)| json!({ "id": id, "text": text, "is_correct": correct }))
            .collect::<Vec<_>>(),
    })
}

async fn join(client: &reqwest::Client, address: &str, code: &str, name: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/join", address))
        .json(&json!({ "code": code, "student_name": name }))
        .send()
        .await
        .expect("Join failed")
}

/// Creates a quiz and opens a room for it. Returns (quiz id, room id, code).
async fn open_room(client: &reqwest::Client, address: &str, token: &str, questions: Value) -> (i64, i64, String) {
    let quiz: Value = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(token)
        .json(&json!({ "title": "Quiz", "questions": questions }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let created: Value = client
        .post(format!("{}/api/rooms", address))
        .bearer_auth(token)
        .json(&json!({ "quiz_id": quiz["id"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    (
        quiz["id"].as_i64().unwrap(),
        created["room"]["id"].as_i64().unwrap(),
        created["room"]["code"].as_str().unwrap().to_string(),
    )
}

/// Reads the next server-sent event with data, skipping keep-alive comments.
/// Returns the event name and its JSON payload.
async fn next_event(response: &mut reqwest::Response, buffer: &mut Vec<u8>) -> (String, Value) {
    loop {
        if let Some(end) = buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = buffer.drain(..end + 2).collect();
            let block = String::from_utf8(block).expect("Event is not UTF-8");

            let mut name = String::new();
            let mut data = String::new();
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    name = value.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push_str(value.trim_start());
                }
            }
            if !data.is_empty() {
                return (name, serde_json::from_str(&data).expect("Event data is not JSON"));
            }
            continue;
        }

        let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
            .await
            .expect("Timed out waiting for an event")
            .expect("Failed to read event stream")
            .expect("Event stream ended");
        buffer.extend_from_slice(&chunk);
    }
}

#[tokio::test]
async fn health_check_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": "yo", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_conflicts_and_bad_password_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    teacher_token(&client, &address, "teacher_dup").await;

    let again = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": "teacher_dup", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);

    let login = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": "teacher_dup", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 401);
}

#[tokio::test]
async fn quiz_routes_require_a_teacher() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let anonymous = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let token_a = teacher_token(&client, &address, "teacher_a").await;
    let token_b = teacher_token(&client, &address, "teacher_b").await;

    let quiz: Value = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(&token_a)
        .json(&json!({ "title": "Private", "questions": [] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let foreign = client
        .get(format!("{}/api/quizzes/{}", address, quiz["id"]))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status().as_u16(), 403);
}

#[tokio::test]
async fn invalid_questions_are_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address, "teacher_invalid").await;

    let two_correct = mc(
        "Broken",
        &[(Uuid::new_v4(), "a", true), (Uuid::new_v4(), "b", true)],
    );
    let response = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(&token)
        .json(&json!({ "title": "Broken", "questions": [two_correct] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn question_editor_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address, "teacher_editor").await;

    let quiz: Value = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(&token)
        .json(&json!({ "title": "Editor", "questions": [] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_i64().unwrap();

    // Blank question: two options, the first correct.
    let quiz: Value = client
        .post(format!("{}/api/quizzes/{}/questions", address, quiz_id))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quiz["questions"][0]["options"].as_array().unwrap().len(), 2);

    let edit_url = format!("{}/api/quizzes/{}/questions/0", address, quiz_id);
    let mut last = Value::Null;
    for _ in 0..5 {
        last = client
            .patch(&edit_url)
            .bearer_auth(&token)
            .json(&json!({ "op": "add_option" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    }
    // The fifth add would be the seventh option.
    assert_eq!(last["changed"], false);
    assert_eq!(last["question"]["options"].as_array().unwrap().len(), 6);

    let removed: Value = client
        .patch(&edit_url)
        .bearer_auth(&token)
        .json(&json!({ "op": "remove_option", "index": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed["changed"], true);
    assert_eq!(removed["question"]["options"][0]["is_correct"], true);

    let stored: Value = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["questions"][0]["options"].as_array().unwrap().len(), 5);

    let missing = client
        .patch(format!("{}/api/quizzes/{}/questions/9", address, quiz_id))
        .bearer_auth(&token)
        .json(&json!({ "op": "add_option" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn live_room_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address, "teacher_live").await;

    let (q1_right, q1_wrong) = (Uuid::new_v4(), Uuid::new_v4());
    let (q2_right, q2_wrong) = (Uuid::new_v4(), Uuid::new_v4());
    let quiz: Value = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Capitals",
            "questions": [
                mc("Capital of France?", &[(q1_right, "Paris", true), (q1_wrong, "Lyon", false)]),
                mc("Capital of Italy?", &[(q2_wrong, "Milan", false), (q2_right, "Rome", true)]),
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // 1. Open a room
    let created = client
        .post(format!("{}/api/rooms", address))
        .bearer_auth(&token)
        .json(&json!({ "quiz_id": quiz["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    let room_id = created["room"]["id"].as_i64().unwrap();
    let code = created["room"]["code"].as_str().unwrap().to_string();
    assert_eq!(created["room"]["status"], "waiting");
    assert_eq!(created["join_url"], format!("http://quiz.test/join/{}", code));

    let room_url = format!("{}/api/rooms/{}", address, room_id);

    // 2. Starting an empty room is a no-op
    let start: Value = client
        .post(format!("{}/start", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(start["changed"], false);
    assert_eq!(start["room"]["status"], "waiting");

    // 3. Students find the room by code and join
    let lookup: Value = client
        .get(format!("{}/api/rooms/code/{}", address, code.to_lowercase()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(lookup["quiz_title"], "Capitals");
    assert_eq!(lookup["question_count"], 2);

    let anna: Value = join(&client, &address, &code, "Anna").await.json().await.unwrap();
    let bela: Value = join(&client, &address, &code, "Béla").await.json().await.unwrap();
    let anna_token = anna["token"].as_str().unwrap().to_string();
    let bela_token = bela["token"].as_str().unwrap().to_string();

    let students_only = client
        .post(format!("{}/start", room_url))
        .bearer_auth(&anna_token)
        .send()
        .await
        .unwrap();
    assert_eq!(students_only.status().as_u16(), 403);

    // 4. Start
    let start: Value = client
        .post(format!("{}/start", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(start["changed"], true);
    assert_eq!(start["room"]["status"], "active");
    assert_eq!(start["room"]["current_question_index"], 0);

    let play: Value = client
        .get(format!("{}/api/play", address))
        .bearer_auth(&anna_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(play["current_question"]["text"], "Capital of France?");
    assert!(play["current_question"]["options"][0].get("is_correct").is_none());

    // 5. Answer the first question
    let submit = |student: String, index: i32, option: Uuid| {
        let client = client.clone();
        let address = address.clone();
        async move {
            client
                .post(format!("{}/api/play/answers", address))
                .bearer_auth(student)
                .json(&json!({
                    "question_index": index,
                    "answer": { "kind": "choice", "selected_option_id": option }
                }))
                .send()
                .await
                .unwrap()
        }
    };

    let anna_first = submit(anna_token.clone(), 0, q1_right).await;
    assert_eq!(anna_first.status().as_u16(), 201);
    let anna_first: Value = anna_first.json().await.unwrap();
    assert_eq!(anna_first["is_correct"], true);
    assert!(anna_first["score"].as_i64().unwrap() >= 500);

    let bela_first: Value = submit(bela_token.clone(), 0, q1_wrong).await.json().await.unwrap();
    assert_eq!(bela_first["is_correct"], false);
    assert_eq!(bela_first["score"], 0);

    let again = submit(anna_token.clone(), 0, q1_wrong).await;
    assert_eq!(again.status().as_u16(), 409);

    let tally: Value = client
        .get(format!("{}/tally", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tally["answered"], 2);
    assert_eq!(tally["options"][0]["count"], 1);
    assert_eq!(tally["options"][0]["is_correct"], true);
    assert_eq!(tally["options"][1]["count"], 1);

    // 6. Advance; the first question is now closed
    let advance: Value = client
        .post(format!("{}/advance", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(advance["room"]["current_question_index"], 1);

    let late = submit(bela_token.clone(), 0, q1_right).await;
    assert_eq!(late.status().as_u16(), 400);

    let anna_second = submit(anna_token.clone(), 1, q2_right).await;
    assert_eq!(anna_second.status().as_u16(), 201);

    // 7. Advancing past the last question completes the room
    let finish: Value = client
        .post(format!("{}/advance", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(finish["changed"], true);
    assert_eq!(finish["room"]["status"], "completed");

    let after: Value = client
        .post(format!("{}/advance", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["changed"], false);

    let too_late = join(&client, &address, &code, "Cili").await;
    assert_eq!(too_late.status().as_u16(), 400);

    // 8. Results and CSV
    let results: Value = client
        .get(format!("{}/results", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = results["results"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["student_name"], "Anna");
    assert_eq!(rows[0]["correct"], 2);
    assert_eq!(rows[0]["percentage"], 100);
    assert_eq!(rows[1]["student_name"], "Béla");
    assert_eq!(rows[1]["correct"], 0);

    let csv = client
        .get(format!("{}/results.csv", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(csv.status().as_u16(), 200);
    let disposition = csv.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains(&format!("results-{}.csv", code)));
    let body = csv.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Name,Correct,Total"));
    assert!(lines[1].starts_with("Anna,2,2,100%,"));
}

#[tokio::test]
async fn missing_room_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address, "teacher_missing").await;

    let response = client
        .post(format!("{}/api/rooms/424242/start", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let unknown_code = client
        .get(format!("{}/api/rooms/code/ZZZZZZ", address))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_code.status().as_u16(), 404);
}

#[tokio::test]
async fn leaving_marks_participant_inactive() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address, "teacher_leave").await;

    let quiz: Value = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(&token)
        .json(&json!({
            "title": "One",
            "questions": [mc("Q", &[(Uuid::new_v4(), "a", true), (Uuid::new_v4(), "b", false)])]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let created: Value = client
        .post(format!("{}/api/rooms", address))
        .bearer_auth(&token)
        .json(&json!({ "quiz_id": quiz["id"], "control_mode": "manual" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let room_id = created["room"]["id"].as_i64().unwrap();
    let code = created["room"]["code"].as_str().unwrap();

    let student: Value = join(&client, &address, code, "Dani").await.json().await.unwrap();
    let student_token = student["token"].as_str().unwrap();

    let leave = client
        .post(format!("{}/api/play/leave", address))
        .bearer_auth(student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(leave.status().as_u16(), 204);

    // Nobody active any more, so the room cannot start.
    let start: Value = client
        .post(format!("{}/api/rooms/{}/start", address, room_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(start["changed"], false);

    let dashboard: Value = client
        .get(format!("{}/api/rooms/{}", address, room_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["participants"][0]["is_active"], false);
    assert!(dashboard["tally"].is_null());
}

#[tokio::test]
async fn quiz_is_frozen_while_a_room_is_open() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address, "teacher_frozen").await;

    let questions = json!([
        mc("First", &[(Uuid::new_v4(), "a", true), (Uuid::new_v4(), "b", false)]),
        mc("Second", &[(Uuid::new_v4(), "c", true), (Uuid::new_v4(), "d", false)]),
    ]);
    let (quiz_id, room_id, code) = open_room(&client, &address, &token, questions).await;
    let quiz_url = format!("{}/api/quizzes/{}", address, quiz_id);

    let replace = client
        .put(&quiz_url)
        .bearer_auth(&token)
        .json(&json!({ "title": "Changed", "questions": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(replace.status().as_u16(), 409);

    let append = client
        .post(format!("{}/questions", quiz_url))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(append.status().as_u16(), 409);

    let edit = client
        .patch(format!("{}/questions/0", quiz_url))
        .bearer_auth(&token)
        .json(&json!({ "op": "set_text", "text": "Edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(edit.status().as_u16(), 409);

    let student: Value = join(&client, &address, &code, "Anna").await.json().await.unwrap();
    let room_url = format!("{}/api/rooms/{}", address, room_id);
    client
        .post(format!("{}/start", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let answered = client
        .post(format!("{}/api/play/answers", address))
        .bearer_auth(student["token"].as_str().unwrap())
        .json(&json!({ "question_index": 0, "answer": { "kind": "text", "text": "x" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(answered.status().as_u16(), 201);

    let remove = client
        .delete(format!("{}/questions/0", quiz_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(remove.status().as_u16(), 409);

    let dashboard: Value = client
        .get(&room_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["question_count"], 2);
    assert_eq!(dashboard["current_question"]["text"], "First");
    assert_eq!(dashboard["leaderboard"][0]["total"], 2);

    // Once the room is over the quiz can be edited again.
    let end: Value = client
        .post(format!("{}/end", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(end["room"]["status"], "completed");

    let edit = client
        .patch(format!("{}/questions/0", quiz_url))
        .bearer_auth(&token)
        .json(&json!({ "op": "set_text", "text": "Edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(edit.status().as_u16(), 200);
}

#[tokio::test]
async fn student_names_are_stored_as_typed() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address, "teacher_names").await;

    let questions = json!([mc("Q", &[(Uuid::new_v4(), "a", true), (Uuid::new_v4(), "b", false)])]);
    let (_quiz_id, room_id, code) = open_room(&client, &address, &token, questions).await;

    let tom = join(&client, &address, &code, "Tom & Jerry <3").await;
    assert_eq!(tom.status().as_u16(), 201);
    let tom: Value = tom.json().await.unwrap();
    assert_eq!(tom["participant"]["student_name"], "Tom & Jerry <3");

    let bold: Value = join(&client, &address, &code, "<b>Zoe</b>").await.json().await.unwrap();
    assert_eq!(bold["participant"]["student_name"], "Zoe");

    let brackets = join(&client, &address, &code, &"<".repeat(40)).await;
    assert_eq!(brackets.status().as_u16(), 201);
    let brackets: Value = brackets.json().await.unwrap();
    assert_eq!(
        brackets["participant"]["student_name"].as_str().unwrap().chars().count(),
        40
    );

    let markup_only = join(&client, &address, &code, "<b></b>").await;
    assert_eq!(markup_only.status().as_u16(), 400);

    let csv = client
        .get(format!("{}/api/rooms/{}/results.csv", address, room_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(csv.lines().any(|line| line == "Tom & Jerry <3,0,1,0%,0,0s"));
}

#[tokio::test]
async fn live_streams_follow_the_room() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address, "teacher_stream").await;

    let questions = json!([mc("Live?", &[(Uuid::new_v4(), "yes", true), (Uuid::new_v4(), "no", false)])]);
    let (_quiz_id, room_id, code) = open_room(&client, &address, &token, questions).await;
    let room_url = format!("{}/api/rooms/{}", address, room_id);

    // 1. Teacher dashboard stream starts with the current state
    let mut dashboard = client
        .get(format!("{}/live", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(dashboard.status().as_u16(), 200);
    assert!(
        dashboard.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    let mut dashboard_buf = Vec::new();

    let (name, first) = next_event(&mut dashboard, &mut dashboard_buf).await;
    assert_eq!(name, "dashboard");
    assert_eq!(first["room"]["status"], "waiting");
    assert!(first["participants"].as_array().unwrap().is_empty());

    // 2. A join shows up on the dashboard
    let student: Value = join(&client, &address, &code, "Anna").await.json().await.unwrap();
    let student_token = student["token"].as_str().unwrap().to_string();

    let (_, joined) = next_event(&mut dashboard, &mut dashboard_buf).await;
    assert_eq!(joined["participants"][0]["student_name"], "Anna");

    // 3. Player stream starts without an open question
    let mut player = client
        .get(format!("{}/api/play/live", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(player.status().as_u16(), 200);
    let mut player_buf = Vec::new();

    let (name, waiting) = next_event(&mut player, &mut player_buf).await;
    assert_eq!(name, "player");
    assert!(waiting["current_question"].is_null());

    // 4. Starting the room reaches both streams
    client
        .post(format!("{}/start", room_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let (_, started) = next_event(&mut player, &mut player_buf).await;
    assert_eq!(started["room"]["status"], "active");
    assert_eq!(started["current_question"]["text"], "Live?");
    assert!(started["current_question"]["options"][0].get("is_correct").is_none());

    let (_, active) = next_event(&mut dashboard, &mut dashboard_buf).await;
    assert_eq!(active["room"]["status"], "active");
    assert_eq!(active["tally"]["answered"], 0);
}

#[tokio::test]
async fn live_stream_of_another_teachers_room_is_forbidden() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = teacher_token(&client, &address, "teacher_owner").await;
    let other = teacher_token(&client, &address, "teacher_other").await;

    let questions = json!([mc("Q", &[(Uuid::new_v4(), "a", true), (Uuid::new_v4(), "b", false)])]);
    let (_quiz_id, room_id, _code) = open_room(&client, &address, &owner, questions).await;

    let response = client
        .get(format!("{}/api/rooms/{}/live", address, room_id))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}
