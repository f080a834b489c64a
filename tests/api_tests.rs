// tests/api_tests.rs

use quiz_backend::{config::Config, routes, state::AppState, store::MemoryStore, utils::jwt};
use std::sync::Arc;

const TEST_SECRET: &str = "test_secret_for_integration_tests";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
///
/// Tests run against the in-memory store, so every test gets a fresh,
/// isolated dataset and no external database is required.
async fn spawn_app() -> String {
    let config = Config {
        database_url: None,
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
    };

    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config,
    };

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

/// Forges the token the external identity issuer would hand out.
fn token_for(user_id: i64, role: &str) -> String {
    jwt::sign_jwt(user_id, role, TEST_SECRET, 600).expect("Failed to sign test token")
}

fn math_quiz_payload() -> serde_json::Value {
    serde_json::json!({
        "title": format!("Math {}", &uuid::Uuid::new_v4().to_string()[..8]),
        "description": "Basic arithmetic",
        "questions": [{
            "text": "2+2=?",
            "option_a": "3",
            "option_b": "4",
            "option_c": "5",
            "option_d": "6",
            "correct_option": "b"
        }]
    })
}

async fn create_quiz(
    client: &reqwest::Client,
    address: &str,
    payload: &serde_json::Value,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/quizzes", address))
        .bearer_auth(token_for(1, "admin"))
        .json(payload)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Failed to parse quiz json")
}

#[tokio::test]
async fn unknown_route_is_404() {
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
async fn quiz_routes_require_a_bearer_identity() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/quizzes", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn create_quiz_is_admin_only() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/quizzes", address))
        .bearer_auth(token_for(2, "user"))
        .json(&math_quiz_payload())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn create_quiz_rejects_empty_title() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let mut payload = math_quiz_payload();
    payload["title"] = serde_json::json!("");

    let response = client
        .post(format!("{}/quizzes", address))
        .bearer_auth(token_for(1, "admin"))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn create_quiz_rejects_bad_correct_option() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Not a slot key at all.
    let mut payload = math_quiz_payload();
    payload["questions"][0]["correct_option"] = serde_json::json!("e");
    let response = client
        .post(format!("{}/quizzes", address))
        .bearer_auth(token_for(1, "admin"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // A key whose slot is not offered.
    let mut payload = math_quiz_payload();
    payload["questions"][0]["option_c"] = serde_json::Value::Null;
    payload["questions"][0]["correct_option"] = serde_json::json!("c");
    let response = client
        .post(format!("{}/quizzes", address))
        .bearer_auth(token_for(1, "admin"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("not offered"), "unexpected error: {}", error);
}

#[tokio::test]
async fn created_quiz_reads_back_in_order_without_answer_key() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let payload = serde_json::json!({
        "title": "Roundtrip",
        "description": "",
        "questions": [
            {"text": "First?", "option_a": "Yes  Spaced", "option_b": "no", "correct_option": "a"},
            {"text": "Second?", "option_a": "x", "option_b": "Y", "option_c": "z", "correct_option": "c"},
            {"text": "Third?", "option_a": "1", "option_b": "2", "option_d": "4", "correct_option": "d"}
        ]
    });
    let quiz = create_quiz(&client, &address, &payload).await;
    let quiz_id = quiz["id"].as_i64().unwrap();

    let response = client
        .get(format!("{}/quizzes/{}/questions", address, quiz_id))
        .bearer_auth(token_for(5, "user"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let raw = response.text().await.unwrap();
    assert!(
        !raw.contains("correct_option"),
        "answer key leaked to a taking user: {}",
        raw
    );

    let questions: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(questions.len(), 3);
    let texts: Vec<&str> = questions.iter().map(|q| q["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["First?", "Second?", "Third?"]);
    // Option text reads back byte-identical, case and whitespace included.
    assert_eq!(questions[0]["option_a"], "Yes  Spaced");
    assert_eq!(questions[1]["option_b"], "Y");
    // Absent slots stay absent.
    assert!(questions[0]["option_c"].is_null());
}

#[tokio::test]
async fn listing_quizzes_returns_metadata_only() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz = create_quiz(&client, &address, &math_quiz_payload()).await;

    let response = client
        .get(format!("{}/quizzes", address))
        .bearer_auth(token_for(5, "user"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let list: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], quiz["id"]);
    assert_eq!(list[0]["title"], quiz["title"]);
    assert!(list[0].get("questions").is_none());
}

#[tokio::test]
async fn questions_of_unknown_quiz_are_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/quizzes/999/questions", address))
        .bearer_auth(token_for(5, "user"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn math_quiz_end_to_end() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz = create_quiz(&client, &address, &math_quiz_payload()).await;
    let quiz_id = quiz["id"].as_i64().unwrap();
    let question_id = quiz["questions"][0]["id"].as_i64().unwrap();

    // First user answers correctly: 1/1.
    let response = client
        .post(format!("{}/quizzes/{}/attempt", address, quiz_id))
        .bearer_auth(token_for(10, "user"))
        .json(&serde_json::json!({
            "answers": [{"question_id": question_id, "selected_option": "b"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let attempt: serde_json::Value = response.json().await.unwrap();
    assert_eq!(attempt["score"], 1);
    assert_eq!(attempt["total"], 1);

    // The same user cannot resubmit: reject-duplicate policy.
    let response = client
        .post(format!("{}/quizzes/{}/attempt", address, quiz_id))
        .bearer_auth(token_for(10, "user"))
        .json(&serde_json::json!({
            "answers": [{"question_id": question_id, "selected_option": "a"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // A second user answering "a" is graded 0/1.
    let response = client
        .post(format!("{}/quizzes/{}/attempt", address, quiz_id))
        .bearer_auth(token_for(11, "user"))
        .json(&serde_json::json!({
            "answers": [{"question_id": question_id, "selected_option": "a"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let attempt: serde_json::Value = response.json().await.unwrap();
    assert_eq!(attempt["score"], 0);
    assert_eq!(attempt["total"], 1);
}

#[tokio::test]
async fn update_quiz_replaces_questions_until_first_attempt() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz = create_quiz(&client, &address, &math_quiz_payload()).await;
    let quiz_id = quiz["id"].as_i64().unwrap();

    // Full replace with a two-question set.
    let replacement = serde_json::json!({
        "title": "Math v2",
        "description": "Updated",
        "questions": [
            {"text": "1+1=?", "option_a": "2", "option_b": "3", "correct_option": "a"},
            {"text": "3*3=?", "option_a": "6", "option_b": "9", "correct_option": "b"}
        ]
    });
    let response = client
        .put(format!("{}/quizzes/{}", address, quiz_id))
        .bearer_auth(token_for(1, "admin"))
        .json(&replacement)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Math v2");
    assert_eq!(updated["questions"].as_array().unwrap().len(), 2);

    // Updating an unknown quiz is 404.
    let response = client
        .put(format!("{}/quizzes/999", address))
        .bearer_auth(token_for(1, "admin"))
        .json(&replacement)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // Once an attempt exists the answer key is frozen.
    let question_id = updated["questions"][0]["id"].as_i64().unwrap();
    client
        .post(format!("{}/quizzes/{}/attempt", address, quiz_id))
        .bearer_auth(token_for(20, "user"))
        .json(&serde_json::json!({
            "answers": [{"question_id": question_id, "selected_option": "a"}]
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .put(format!("{}/quizzes/{}", address, quiz_id))
        .bearer_auth(token_for(1, "admin"))
        .json(&replacement)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn delete_quiz_cascades_and_404s_afterwards() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz = create_quiz(&client, &address, &math_quiz_payload()).await;
    let quiz_id = quiz["id"].as_i64().unwrap();
    let question_id = quiz["questions"][0]["id"].as_i64().unwrap();

    // Leave an attempt behind so the cascade has something to remove.
    client
        .post(format!("{}/quizzes/{}/attempt", address, quiz_id))
        .bearer_auth(token_for(30, "user"))
        .json(&serde_json::json!({
            "answers": [{"question_id": question_id, "selected_option": "b"}]
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .delete(format!("{}/quizzes/{}", address, quiz_id))
        .bearer_auth(token_for(1, "admin"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    // The quiz, its questions and its leaderboard are all gone.
    for path in [
        format!("/quizzes/{}", quiz_id),
        format!("/quizzes/{}/questions", quiz_id),
        format!("/quizzes/leaderboard/{}", quiz_id),
    ] {
        let response = client
            .get(format!("{}{}", address, path))
            .bearer_auth(token_for(30, "user"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404, "expected 404 for {}", path);
    }

    // Deleting twice is 404.
    let response = client
        .delete(format!("{}/quizzes/{}", address, quiz_id))
        .bearer_auth(token_for(1, "admin"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn attempts_are_visible_to_owner_and_admin_only() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz = create_quiz(&client, &address, &math_quiz_payload()).await;
    let quiz_id = quiz["id"].as_i64().unwrap();
    let question_id = quiz["questions"][0]["id"].as_i64().unwrap();

    let attempt: serde_json::Value = client
        .post(format!("{}/quizzes/{}/attempt", address, quiz_id))
        .bearer_auth(token_for(40, "user"))
        .json(&serde_json::json!({
            "answers": [{"question_id": question_id, "selected_option": "b"}]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_i64().unwrap();

    // Owner sees it.
    let response = client
        .get(format!("{}/attempts/{}", address, attempt_id))
        .bearer_auth(token_for(40, "user"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // A stranger does not.
    let response = client
        .get(format!("{}/attempts/{}", address, attempt_id))
        .bearer_auth(token_for(41, "user"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // An admin does, and so does the per-quiz listing.
    let response = client
        .get(format!("{}/attempts/{}", address, attempt_id))
        .bearer_auth(token_for(1, "admin"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let attempts: Vec<serde_json::Value> = client
        .get(format!("{}/quizzes/{}/attempts", address, quiz_id))
        .bearer_auth(token_for(1, "admin"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["user_id"], 40);
}
