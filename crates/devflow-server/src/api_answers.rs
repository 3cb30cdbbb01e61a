//! Answer endpoints: posting, voting and acceptance.

use crate::api::{with_conn, ApiError};
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use devflow_qa::{Answer, NewAnswer};
use devflow_types::VoteAction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for an answer vote.
///
/// `userId` is accepted for compatibility with older clients. The voter is
/// always the authenticated user, and naming anyone else is rejected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteAnswerRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<i64>,
}

/// Accepts an ID given either as a JSON number or a numeric string.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("userId must be numeric")),
    }
}

/// Response body for answer votes and acceptance.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub message: String,
    pub answer: Answer,
}

/// Handler for `POST /api/answers` and `POST /api/answers/create`.
pub async fn post_answer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Json(payload): Json<NewAnswer>,
) -> Result<(StatusCode, Json<Answer>), ApiError> {
    let answer = with_conn(state, move |conn| {
        Ok(devflow_qa::post_answer(conn, &actor, &payload)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

/// Handler for `POST` and `PUT /api/answers/{id}/vote`.
pub async fn vote_answer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(answer_id): Path<i64>,
    Json(payload): Json<VoteAnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let action: VoteAction = payload.action.parse().map_err(|_| {
        ApiError::BadRequest("Invalid action. Use \"upvote\" or \"downvote\".".to_string())
    })?;
    if payload.user_id.is_some_and(|id| id != actor.id) {
        return Err(ApiError::Forbidden(
            "You can only vote as yourself".to_string(),
        ));
    }

    let answer = with_conn(state, move |conn| {
        Ok(devflow_qa::vote_answer(conn, &actor, answer_id, action)?)
    })
    .await?;
    Ok(Json(AnswerResponse {
        message: format!("Answer successfully {action}d"),
        answer,
    }))
}

/// Handler for `PUT /api/answers/{id}/accept`.
pub async fn accept_answer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(answer_id): Path<i64>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let answer = with_conn(state, move |conn| {
        Ok(devflow_qa::accept_answer(conn, &actor, answer_id)?)
    })
    .await?;
    Ok(Json(AnswerResponse {
        message: "Answer accepted successfully".to_string(),
        answer,
    }))
}
