//! Question endpoints.

use crate::api::{with_conn, ApiError};
use crate::middleware::AuthUser;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use devflow_qa::{
    Question, QuestionFilter, QuestionInput, QuestionSummary, QuestionThread, QuestionUpdate,
    QuestionVoteOutcome,
};
use devflow_types::{QuestionStatus, VoteDirection};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Query string for `GET /api/questions`. Empty values are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuestionsQuery {
    /// Comma-separated tag list.
    pub tags: Option<String>,
    pub search: Option<String>,
    pub min_votes: Option<String>,
    pub max_votes: Option<String>,
    pub status: Option<String>,
}

impl ListQuestionsQuery {
    fn into_filter(self) -> Result<QuestionFilter, ApiError> {
        let tags = self
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(QuestionFilter {
            tags,
            search: non_empty(self.search),
            min_votes: parse_bound("minVotes", self.min_votes)?,
            max_votes: parse_bound("maxVotes", self.max_votes)?,
            status: non_empty(self.status)
                .map(|s| s.parse::<QuestionStatus>())
                .transpose()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bound(name: &str, value: Option<String>) -> Result<Option<i64>, ApiError> {
    non_empty(value)
        .map(|v| v.trim().parse::<i64>())
        .transpose()
        .map_err(|_| ApiError::BadRequest(format!("{name} must be an integer")))
}

/// Request body for a question vote.
#[derive(Debug, Deserialize)]
pub struct VoteQuestionRequest {
    #[serde(rename = "voteType", default)]
    pub vote_type: String,
}

/// Handler for `GET /api/questions`.
pub async fn list_questions_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<Vec<QuestionSummary>>, ApiError> {
    let filter = query.into_filter()?;
    let questions = with_conn(state, move |conn| {
        Ok(devflow_qa::list_questions(conn, &filter)?)
    })
    .await?;
    Ok(Json(questions))
}

/// Handler for `POST /api/questions` and `POST /api/questions/create`.
pub async fn create_question_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Json(payload): Json<QuestionInput>,
) -> Result<(StatusCode, Json<Question>), ApiError> {
    let question = with_conn(state, move |conn| {
        Ok(devflow_qa::create_question(conn, &actor, &payload)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Handler for `GET /api/questions/{id}`.
pub async fn get_question_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(question_id): Path<i64>,
) -> Result<Json<Question>, ApiError> {
    let question = with_conn(state, move |conn| {
        Ok(devflow_qa::get_question(conn, question_id)?)
    })
    .await?;
    Ok(Json(question))
}

/// Handler for `PUT /api/questions/{id}`.
pub async fn update_question_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(question_id): Path<i64>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<Question>, ApiError> {
    let question = with_conn(state, move |conn| {
        Ok(devflow_qa::update_question(conn, &actor, question_id, &payload)?)
    })
    .await?;
    Ok(Json(question))
}

/// Handler for `DELETE /api/questions/{id}`.
pub async fn delete_question_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(question_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    with_conn(state, move |conn| {
        Ok(devflow_qa::delete_question(conn, &actor, question_id)?)
    })
    .await?;
    Ok(Json(json!({ "message": "Question deleted successfully" })))
}

/// Handler for `GET /api/questions/{id}/user-answers`.
pub async fn question_thread_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(question_id): Path<i64>,
) -> Result<Json<QuestionThread>, ApiError> {
    let thread = with_conn(state, move |conn| {
        Ok(devflow_qa::question_thread(conn, question_id)?)
    })
    .await?;
    Ok(Json(thread))
}

/// Handler for `POST /api/questions/{id}/vote`.
pub async fn vote_question_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(question_id): Path<i64>,
    Json(payload): Json<VoteQuestionRequest>,
) -> Result<Json<QuestionVoteOutcome>, ApiError> {
    let direction: VoteDirection = payload.vote_type.parse().map_err(|_| {
        ApiError::BadRequest("Invalid vote type. Use \"up\" or \"down\".".to_string())
    })?;

    let outcome = with_conn(state, move |conn| {
        Ok(devflow_qa::vote_question(conn, &actor, question_id, direction)?)
    })
    .await?;
    Ok(Json(outcome))
}
