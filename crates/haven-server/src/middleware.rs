//! Bearer-token authentication.
//!
//! The opaque token issued at registration or login is the credential; it
//! arrives as `Authorization: Bearer <token>`. Protected routes use
//! [`auth_middleware`], which rejects missing or unknown tokens. The turn
//! endpoint accepts anonymous callers and uses [`resolve_user`] directly:
//! a missing header means an anonymous, unpersisted turn, while a token
//! that fails to resolve is still rejected.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use haven_identity::{user_by_token, User};
use std::sync::Arc;

use crate::AppState;

/// Wrapper for the authenticated [`User`] stored in request extensions.
#[derive(Clone, Debug)]
pub struct UserContext(pub User);

/// Extracts the bearer token from the `Authorization` header, if present.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_string)
}

/// Resolves the caller's identity from request headers.
///
/// Returns `Ok(None)` when no credential was supplied (anonymous caller),
/// `Ok(Some(user))` for a valid token, and `Err(UNAUTHORIZED)` for a token
/// that does not resolve — a bad credential is never silently downgraded
/// to anonymous.
pub async fn resolve_user(
    state: &Arc<AppState>,
    headers: &HeaderMap,
) -> Result<Option<User>, StatusCode> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };

    let pool = state.pool.clone();
    let user = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        user_by_token(&conn, &token).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    match user {
        Some(user) => Ok(Some(user)),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Middleware for routes that require an authenticated caller.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let user = resolve_user(&state, req.headers())
        .await?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(UserContext(user));

    Ok(next.run(req).await)
}
