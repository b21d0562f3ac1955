use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use quiz_api::build_router;
use quiz_api::config::Config;
use services::{AppServices, Clock};
use storage::repository::Storage;

fn test_app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "BCRYPT_COST" => Some("4".to_owned()),
        "SECRET_KEY" => Some("api-test-secret".to_owned()),
        _ => None,
    });
    let services = AppServices::new(&Storage::in_memory(), Clock::System, &config.auth_settings());
    build_router(services, &config)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signed_in(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Tester", "email": email, "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, token) = send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    token["access_token"].as_str().unwrap().to_owned()
}

async fn quiz_with_one_question(app: &Router, token: &str) -> (String, String) {
    let (status, quiz_set) = send(
        app,
        Method::POST,
        "/api/v1/quiz-sets",
        Some(token),
        Some(json!({
            "title": "T",
            "description": "",
            "category": "Math",
            "difficulty": "easy",
            "estimated_time": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let quiz_set_id = quiz_set["id"].as_str().unwrap().to_owned();

    let (status, question) = send(
        app,
        Method::POST,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/questions"),
        Some(token),
        Some(json!({
            "question": "What is 2+2?",
            "options": ["3", "4", "5", "6"],
            "correct_answer": 1,
            "type": "radio",
            "justification": "2+2 equals 4"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (quiz_set_id, question["id"].as_str().unwrap().to_owned())
}

#[tokio::test]
async fn health_and_root_respond() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Quiz API");
}

#[tokio::test]
async fn correct_submission_scores_full_marks() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;
    let (quiz_set_id, question_id) = quiz_with_one_question(&app, &token).await;

    let (status, result) = send(
        &app,
        Method::POST,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/submit"),
        Some(&token),
        Some(json!({ "answers": { question_id.clone(): 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["score"], 100.0);
    assert_eq!(result["correct_answers"], 1);
    assert_eq!(result["total_questions"], 1);
    assert_eq!(result["detailed_results"][0]["correct"], true);
}

#[tokio::test]
async fn wrong_submission_scores_zero() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;
    let (quiz_set_id, question_id) = quiz_with_one_question(&app, &token).await;

    let (status, result) = send(
        &app,
        Method::POST,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/submit"),
        Some(&token),
        Some(json!({ "answers": { question_id: 0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["score"], 0.0);
    assert_eq!(result["correct_answers"], 0);
}

#[tokio::test]
async fn answers_for_unknown_keys_are_ignored() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;
    let (quiz_set_id, question_id) = quiz_with_one_question(&app, &token).await;

    let (status, result) = send(
        &app,
        Method::POST,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/submit"),
        Some(&token),
        Some(json!({
            "answers": {
                question_id.clone(): 1,
                "q-legacy-7": 2,
                "6f1c2d3e-0000-4000-8000-000000000000": 0
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["score"], 100.0);
    assert_eq!(result["correct_answers"], 1);
    assert_eq!(result["total_questions"], 1);
    assert_eq!(result["detailed_results"].as_array().unwrap().len(), 1);
    assert_eq!(result["detailed_results"][0]["question_id"], question_id);
}

#[tokio::test]
async fn mutations_require_a_valid_token() {
    let app = test_app();
    let body = json!({
        "title": "T",
        "description": "",
        "category": "Math",
        "difficulty": "easy",
        "estimated_time": 10
    });

    let (status, error) =
        send(&app, Method::POST, "/api/v1/quiz-sets", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["success"], false);

    let (status, error) =
        send(&app, Method::POST, "/api/v1/quiz-sets", Some("not.a.token"), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["error"], "Could not validate credentials");
}

#[tokio::test]
async fn registration_and_login_errors() {
    let app = test_app();
    let _ = signed_in(&app, "ann@example.com").await;

    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Again", "email": "ANN@example.com", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Email already registered");

    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["error"], "Incorrect email or password");
}

#[tokio::test]
async fn me_hides_password_hash_and_refresh_issues_token() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;

    let (status, me) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ann@example.com");
    assert!(me.get("password_hash").is_none());

    let (status, refreshed) =
        send(&app, Method::POST, "/api/v1/auth/refresh", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["token_type"], "bearer");
}

#[tokio::test]
async fn questions_are_scoped_to_their_quiz_set() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;
    let (first, question_id) = quiz_with_one_question(&app, &token).await;
    let (second, _) = quiz_with_one_question(&app, &token).await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/quiz-sets/{first}/questions/{question_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = send(
        &app,
        Method::GET,
        &format!("/api/v1/quiz-sets/{second}/questions/{question_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "Question not found");

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/quiz-sets/{first}/questions/{question_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Question deleted successfully");

    let (_, quiz_set) =
        send(&app, Method::GET, &format!("/api/v1/quiz-sets/{first}"), None, None).await;
    assert_eq!(quiz_set["total_questions"], 0);
}

#[tokio::test]
async fn malformed_question_and_bad_limits_are_rejected() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;
    let (quiz_set_id, _) = quiz_with_one_question(&app, &token).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/questions"),
        Some(&token),
        Some(json!({
            "question": "Pick",
            "options": ["a", "b"],
            "correct_answer": 5,
            "type": "radio",
            "justification": ""
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/v1/quiz-sets?limit=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/questions?limit=0"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sets) =
        send(&app, Method::GET, "/api/v1/quiz-sets?skip=0&limit=10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sets.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn progress_round_trip_and_completion() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;
    let (quiz_set_id, question_id) = quiz_with_one_question(&app, &token).await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/progress/{quiz_set_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, saved) = send(
        &app,
        Method::POST,
        "/api/v1/progress",
        Some(&token),
        Some(json!({
            "quiz_set_id": quiz_set_id.clone(),
            "current_question": 1,
            "answers": { question_id.clone(): 1 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["current_question"], 1);
    assert!(saved["completed_at"].is_null());

    send(
        &app,
        Method::POST,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/submit"),
        Some(&token),
        Some(json!({ "answers": { question_id: 1 } })),
    )
    .await;

    let (status, progress) = send(
        &app,
        Method::GET,
        &format!("/api/v1/progress/{quiz_set_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["id"], saved["id"]);
    assert_eq!(progress["score"], 100.0);
    assert!(!progress["completed_at"].is_null());
}

#[tokio::test]
async fn analytics_and_user_stats_reflect_submissions() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;
    let (quiz_set_id, question_id) = quiz_with_one_question(&app, &token).await;

    let (status, empty) = send(
        &app,
        Method::GET,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/analytics"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["total_attempts"], 0);

    for answer in [1, 0] {
        send(
            &app,
            Method::POST,
            &format!("/api/v1/quiz-sets/{quiz_set_id}/submit"),
            Some(&token),
            Some(json!({ "answers": { question_id.clone(): answer } })),
        )
        .await;
    }

    let (_, analytics) = send(
        &app,
        Method::GET,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/analytics"),
        None,
        None,
    )
    .await;
    assert_eq!(analytics["total_attempts"], 2);
    assert_eq!(analytics["average_score"], 50.0);
    assert_eq!(analytics["completion_rate"], 1.0);
    assert_eq!(analytics["question_stats"][0]["correct_rate"], 0.5);
    assert!(analytics["question_stats"][0]["avg_time_spent"].is_null());

    let (status, stats) = send(&app, Method::GET, "/api/v1/users/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_quizzes"], 1);
    assert_eq!(stats["completed_quizzes"], 2);
    assert_eq!(stats["weak_categories"], json!(["Math"]));

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/quiz-sets/{}/analytics", "00000000-0000-0000-0000-000000000000"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_quiz_set_removes_it() {
    let app = test_app();
    let token = signed_in(&app, "ann@example.com").await;
    let (quiz_set_id, _) = quiz_with_one_question(&app, &token).await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/quiz-sets/{quiz_set_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Quiz set deleted successfully");

    let (status, error) = send(
        &app,
        Method::GET,
        &format!("/api/v1/quiz-sets/{quiz_set_id}/questions"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "Quiz set not found");
}
