//! Notification inbox endpoints. Every route is scoped to the caller.

use crate::api::{with_conn, ApiError};
use crate::middleware::AuthUser;
use crate::AppState;
use axum::extract::{Extension, Json, Path};
use devflow_notify::Notification;
use devflow_types::limits::RECENT_NOTIFICATIONS_LIMIT;
use serde_json::{json, Value};
use std::sync::Arc;

/// Handler for `GET /api/notifications`.
pub async fn list_notifications_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = with_conn(state, move |conn| {
        Ok(devflow_notify::list_recent(
            conn,
            actor.id,
            RECENT_NOTIFICATIONS_LIMIT,
        )?)
    })
    .await?;
    Ok(Json(notifications))
}

/// Handler for `GET /api/notifications/unread-count`.
pub async fn unread_count_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let count = with_conn(state, move |conn| {
        Ok(devflow_notify::unread_count(conn, actor.id)?)
    })
    .await?;
    Ok(Json(json!({ "count": count })))
}

/// Handler for `PUT /api/notifications/{id}/read`.
pub async fn mark_read_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
    Path(notification_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    with_conn(state, move |conn| {
        Ok(devflow_notify::mark_read(conn, actor.id, notification_id)?)
    })
    .await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}

/// Handler for `PUT /api/notifications/mark-all-read`.
pub async fn mark_all_read_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AuthUser(actor)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user_id = actor.id;
    let changed = with_conn(state, move |conn| {
        Ok(devflow_notify::mark_all_read(conn, user_id)?)
    })
    .await?;
    tracing::debug!(user_id, changed, "marked notifications read");
    Ok(Json(json!({ "message": "All notifications marked as read" })))
}
