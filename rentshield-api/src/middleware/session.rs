//! Session authentication middleware
//!
//! Reads the session token (cookie first, then `Authorization: Bearer`),
//! resolves it through the session manager and injects the resulting
//! [`AuthContext`] into request extensions. Requests without a live session
//! are rejected with 401 before reaching a handler.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use rentshield_shared::auth::middleware::{extract_session_token, AuthContext};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

/// Requires a live session on every request passing through
pub async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = resolve_session(&state, req.headers())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Resolves the caller's session without rejecting anonymous requests
pub async fn resolve_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<AuthContext>, ApiError> {
    let Some(token) = extract_session_token(headers) else {
        debug!("No session token presented");
        return Ok(None);
    };

    Ok(state.sessions.resolve(&token).await?)
}
