use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use devflow_accounts::TokenService;
use devflow_db::{create_pool, DbRuntimeSettings};
use devflow_server::{app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    // Held so the database file outlives the router.
    _dir: TempDir,
}

fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = dir.path().join("devflow.db");
    let pool = create_pool(
        db_path.to_str().expect("temp path is utf-8"),
        DbRuntimeSettings::default(),
    )
    .expect("failed to create pool");
    {
        let conn = pool.get().expect("failed to get connection");
        devflow_db::run_migrations(&conn).expect("failed to run migrations");
    }

    let state = AppState {
        pool,
        tokens: Arc::new(TokenService::new(b"integration-test-secret", 3600)),
    };

    TestApp {
        router: app(state),
        _dir: dir,
    }
}

async fn send(
    app: &TestApp,
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

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user and returns `(user_id, token)`.
async fn register(app: &TestApp, username: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["user"]["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn ask(app: &TestApp, token: &str, title: &str, tags: &[&str]) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/questions",
        Some(token),
        Some(json!({
            "title": title,
            "body": "A description that is long enough to pass",
            "tags": tags,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "ask failed: {body}");
    body["id"].as_i64().unwrap()
}

async fn answer(app: &TestApp, token: &str, question_id: i64) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/answers",
        Some(token),
        Some(json!({
            "questionId": question_id,
            "body": "Try writing a unit test first.",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "answer failed: {body}");
    body["id"].as_i64().unwrap()
}

async fn reputation_of(app: &TestApp, user_id: i64) -> i64 {
    let (status, body) = send(
        app,
        Method::GET,
        &format!("/api/reputation/users/{user_id}/reputation"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["reputation"].as_i64().unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = setup_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_fetch_current_user() {
    let app = setup_app();
    let (user_id, _) = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful!");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/auth/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id);
    assert_eq!(body["user"]["username"], "alice");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = setup_app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice2",
            "email": "alice@example.com",
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = setup_app();

    let (status, body) = send(&app, Method::GET, "/api/auth/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token, authorization denied");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/notifications",
        Some("not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is not valid");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/questions",
        None,
        Some(json!({ "title": "Untouched", "body": "x", "tags": ["a"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay public on the same path.
    let (status, body) = send(&app, Method::GET, "/api/questions", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn ask_answer_accept_upvote_flow() {
    let app = setup_app();
    let (alice, alice_token) = register(&app, "alice").await;
    let (bob, bob_token) = register(&app, "bob").await;

    let question_id = ask(&app, &alice_token, "How do I test?", &["testing"]).await;
    assert_eq!(reputation_of(&app, alice).await, 5);

    let answer_id = answer(&app, &bob_token, question_id).await;
    assert_eq!(reputation_of(&app, bob).await, 10);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/questions/{question_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "answered");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/answers/{answer_id}/accept"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Answer accepted successfully");
    assert_eq!(body["answer"]["status"], "accepted");
    assert_eq!(reputation_of(&app, bob).await, 25);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/answers/{answer_id}/vote"),
        Some(&alice_token),
        Some(json!({ "action": "upvote" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Answer successfully upvoted");
    assert_eq!(body["answer"]["upvotes"], 1);
    assert_eq!(body["answer"]["voters"][0]["userId"], alice);
    assert_eq!(reputation_of(&app, bob).await, 27);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/answers/{answer_id}/vote"),
        Some(&alice_token),
        Some(json!({ "action": "upvote" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User has already upvoted this answer.");
    assert_eq!(reputation_of(&app, bob).await, 27);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/questions/{question_id}/user-answers"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answers"].as_array().unwrap().len(), 1);
    assert_eq!(body["answers"][0]["user"]["username"], "bob");

    let (status, body) = send(&app, Method::GET, "/api/notifications", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"accept"));
    assert!(kinds.contains(&"vote"));

    let (status, body) = send(&app, Method::GET, "/api/notifications", Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["type"], "answer");
}

#[tokio::test]
async fn only_the_asker_can_accept() {
    let app = setup_app();
    let (_, alice_token) = register(&app, "alice").await;
    let (_, bob_token) = register(&app, "bob").await;

    let question_id = ask(&app, &alice_token, "Who may accept?", &["meta"]).await;
    let answer_id = answer(&app, &bob_token, question_id).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/answers/{answer_id}/accept"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only question owner can accept answers");
}

#[tokio::test]
async fn voting_as_someone_else_is_forbidden() {
    let app = setup_app();
    let (alice, alice_token) = register(&app, "alice").await;
    let (_, bob_token) = register(&app, "bob").await;

    let question_id = ask(&app, &alice_token, "Whose vote is it?", &["meta"]).await;
    let answer_id = answer(&app, &bob_token, question_id).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/answers/{answer_id}/vote"),
        Some(&bob_token),
        Some(json!({ "action": "upvote", "userId": alice })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/answers/{answer_id}/vote"),
        Some(&alice_token),
        Some(json!({ "action": "upvote", "userId": alice.to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/answers/{answer_id}/vote"),
        Some(&alice_token),
        Some(json!({ "action": "sideways" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn question_votes_toggle() {
    let app = setup_app();
    let (_, alice_token) = register(&app, "alice").await;
    let (_, bob_token) = register(&app, "bob").await;
    let question_id = ask(&app, &alice_token, "Is this useful?", &["meta"]).await;
    let uri = format!("/api/questions/{question_id}/vote");

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&bob_token),
        Some(json!({ "voteType": "up" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "votes": 1, "hasUpvoted": true, "hasDownvoted": false }));

    let (_, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&bob_token),
        Some(json!({ "voteType": "down" })),
    )
    .await;
    assert_eq!(body, json!({ "votes": -1, "hasUpvoted": false, "hasDownvoted": true }));

    let (_, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&bob_token),
        Some(json!({ "voteType": "down" })),
    )
    .await;
    assert_eq!(body, json!({ "votes": 0, "hasUpvoted": false, "hasDownvoted": false }));

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&bob_token),
        Some(json!({ "voteType": "meh" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn notifications_are_scoped_to_their_recipient() {
    let app = setup_app();
    let (_, alice_token) = register(&app, "alice").await;
    let (_, bob_token) = register(&app, "bob").await;
    let question_id = ask(&app, &alice_token, "Ping me please", &["inbox"]).await;
    answer(&app, &bob_token, question_id).await;

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/notifications/unread-count",
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(body["count"], 1);

    let (_, body) = send(&app, Method::GET, "/api/notifications", Some(&alice_token), None).await;
    let notification_id = body[0]["id"].as_i64().unwrap();
    assert_eq!(body[0]["read"], false);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/notifications/{notification_id}/read"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Notification not found");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/notifications/{notification_id}/read"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/notifications/unread-count",
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(body["count"], 0);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/notifications/mark-all-read",
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All notifications marked as read");
}

#[tokio::test]
async fn question_list_filters() {
    let app = setup_app();
    let (_, alice_token) = register(&app, "alice").await;
    let (_, bob_token) = register(&app, "bob").await;

    let rust_q = ask(&app, &alice_token, "Borrow checker woes", &["rust"]).await;
    let js_q = ask(&app, &alice_token, "Promise chains", &["javascript"]).await;
    answer(&app, &bob_token, js_q).await;
    send(
        &app,
        Method::POST,
        &format!("/api/questions/{rust_q}/vote"),
        Some(&bob_token),
        Some(json!({ "voteType": "up" })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/questions?tags=rust", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], rust_q);

    let (_, body) = send(&app, Method::GET, "/api/questions?search=PROMISE", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], js_q);
    assert_eq!(body[0]["answerCount"], 1);

    let (_, body) = send(&app, Method::GET, "/api/questions?minVotes=1", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], rust_q);

    let (_, body) = send(&app, Method::GET, "/api/questions?status=answered", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], js_q);

    let (_, body) = send(&app, Method::GET, "/api/questions", None, None).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![js_q, rust_q]);

    let accented = ask(&app, &alice_token, "Écrire du code lisible", &["style"]).await;
    // "ÉCRIRE", percent-encoded.
    let (status, body) = send(&app, Method::GET, "/api/questions?search=%C3%89CRIRE", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], accented);

    let (status, _) = send(&app, Method::GET, "/api/questions?minVotes=many", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owner_edits_and_deletes_question() {
    let app = setup_app();
    let (alice, alice_token) = register(&app, "alice").await;
    let (_, bob_token) = register(&app, "bob").await;
    let question_id = ask(&app, &alice_token, "Original title", &["edit"]).await;
    let uri = format!("/api/questions/{question_id}");
    let update = json!({
        "title": "Edited title",
        "body": "An edited description that is long enough",
    });

    let (status, _) = send(&app, Method::PUT, &uri, Some(&bob_token), Some(update.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::PUT, &uri, Some(&alice_token), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Edited title");
    assert_eq!(body["tags"], json!(["edit"]));

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Question deleted successfully");

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Question not found");
    assert_eq!(reputation_of(&app, alice).await, 0);
}

#[tokio::test]
async fn user_profiles_are_public() {
    let app = setup_app();
    let (alice, alice_token) = register(&app, "alice").await;
    ask(&app, &alice_token, "Profile question", &["profile"]).await;

    let (status, body) = send(&app, Method::GET, "/api/auth/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/auth/users/{alice}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["reputation"], 5);
    assert_eq!(body["questions"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/api/auth/users/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}
