//! Reputation lookup.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use axum::extract::{Extension, Json, Path};
use serde_json::{json, Value};
use std::sync::Arc;

/// Handler for `GET /api/reputation/users/{id}/reputation`.
///
/// Always recomputes from activity, so the answer is current even if a
/// cached value went stale.
pub async fn get_reputation_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let reputation = with_conn(state, move |conn| {
        Ok(devflow_reputation::recompute_reputation(conn, user_id)?)
    })
    .await?;
    Ok(Json(json!({ "reputation": reputation })))
}
