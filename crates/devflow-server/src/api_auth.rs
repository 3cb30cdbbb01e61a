//! Account endpoints: registration, login and user profiles.

use crate::api::{with_conn, ApiError};
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use devflow_accounts::{Registration, User};
use devflow_qa::{Answer, Question};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response body for registration and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub user: User,
    pub token: String,
}

/// A user together with everything they have written.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
}

fn load_profile(conn: &Connection, user_id: i64) -> Result<UserProfile, ApiError> {
    let user = devflow_accounts::get_user_refreshed(conn, user_id)?;
    let questions = devflow_qa::list_questions_by_user(conn, user_id)?;
    let answers = devflow_qa::list_answers_by_user(conn, user_id)?;
    Ok(UserProfile {
        user,
        questions,
        answers,
    })
}

/// Handler for `POST /api/auth/register`.
pub async fn register_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<Registration>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let tokens = state.tokens.clone();
    let user = with_conn(state, move |conn| {
        Ok(devflow_accounts::register_user(conn, &payload)?)
    })
    .await?;
    let token = tokens.issue(user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "User registered successfully!",
            user,
            token,
        }),
    ))
}

/// Handler for `POST /api/auth/login`.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let tokens = state.tokens.clone();
    let user = with_conn(state, move |conn| {
        Ok(devflow_accounts::authenticate(
            conn,
            &payload.email,
            &payload.password,
        )?)
    })
    .await?;
    let token = tokens.issue(user.id)?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(SessionResponse {
        message: "Login successful!",
        user,
        token,
    }))
}

/// Handler for `GET /api/auth/user`.
pub async fn current_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = with_conn(state, move |conn| load_profile(conn, actor.id)).await?;
    Ok(Json(profile))
}

/// Handler for `GET /api/auth/users`.
pub async fn list_users_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = with_conn(state, |conn| Ok(devflow_accounts::list_users(conn)?)).await?;
    Ok(Json(users))
}

/// Handler for `GET /api/auth/users/{id}`.
pub async fn get_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = with_conn(state, move |conn| load_profile(conn, user_id)).await?;
    Ok(Json(profile))
}
