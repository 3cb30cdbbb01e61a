//! DevFlow server library logic.

pub mod api;
pub mod api_answers;
pub mod api_auth;
pub mod api_notifications;
pub mod api_questions;
pub mod api_reputation;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Extension, Json, Router,
};
use devflow_accounts::TokenService;
use devflow_db::DbPool;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Issues and verifies session tokens.
    pub tokens: Arc<TokenService>,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
///
/// Public and protected routes may share a path; the auth layer only wraps
/// the methods registered on the protected router.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/user", get(api_auth::current_user_handler))
        .route(
            "/api/questions",
            post(api_questions::create_question_handler),
        )
        .route(
            "/api/questions/create",
            post(api_questions::create_question_handler),
        )
        .route(
            "/api/questions/{id}",
            put(api_questions::update_question_handler)
                .delete(api_questions::delete_question_handler),
        )
        .route(
            "/api/questions/{id}/vote",
            post(api_questions::vote_question_handler),
        )
        .route("/api/answers", post(api_answers::post_answer_handler))
        .route("/api/answers/create", post(api_answers::post_answer_handler))
        .route(
            "/api/answers/{id}/vote",
            post(api_answers::vote_answer_handler).put(api_answers::vote_answer_handler),
        )
        .route(
            "/api/answers/{id}/accept",
            put(api_answers::accept_answer_handler),
        )
        .route(
            "/api/notifications",
            get(api_notifications::list_notifications_handler),
        )
        .route(
            "/api/notifications/unread-count",
            get(api_notifications::unread_count_handler),
        )
        .route(
            "/api/notifications/mark-all-read",
            put(api_notifications::mark_all_read_handler),
        )
        .route(
            "/api/notifications/{id}/read",
            put(api_notifications::mark_read_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(api_auth::register_handler))
        .route("/api/auth/login", post(api_auth::login_handler))
        .route("/api/auth/users", get(api_auth::list_users_handler))
        .route("/api/auth/users/{id}", get(api_auth::get_user_handler))
        .route(
            "/api/questions",
            get(api_questions::list_questions_handler),
        )
        .route(
            "/api/questions/{id}",
            get(api_questions::get_question_handler),
        )
        .route(
            "/api/questions/{id}/user-answers",
            get(api_questions::question_thread_handler),
        )
        .route(
            "/api/reputation/users/{id}/reputation",
            get(api_reputation::get_reputation_handler),
        )
        .merge(protected_routes);

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
