//! Request authentication: resolves the session token to the acting user.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use devflow_types::Actor;
use std::sync::Arc;

use crate::api::{with_conn, ApiError};
use crate::AppState;

/// The authenticated user, stored in request extensions by
/// [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthUser(pub Actor);

/// Name of the cookie that may carry the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Middleware to authenticate requests via a `token` cookie or
/// `Authorization: Bearer`.
///
/// The token must verify against the server secret and name a user that
/// still exists. Anything else is a 401.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let token = extract_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("No token, authorization denied".to_string())
    })?;

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::InternalServerError("app state missing".to_string()))?
        .clone();

    let user_id = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!("rejecting token: {}", e);
        ApiError::Unauthorized("Token is not valid".to_string())
    })?;

    let user = with_conn(state, move |conn| {
        devflow_accounts::get_user(conn, user_id).map_err(|e| match e {
            devflow_accounts::AccountError::NotFound(_) => {
                ApiError::Unauthorized("User not found".to_string())
            }
            other => other.into(),
        })
    })
    .await?;

    req.extensions_mut()
        .insert(AuthUser(Actor::new(user.id, user.username)));

    Ok(next.run(req).await)
}

/// Finds the session token, preferring the cookie over the header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty());
    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
