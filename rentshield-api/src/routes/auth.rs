//! Authentication endpoints
//!
//! - `POST /v1/auth/login`: verify credentials, set the session cookie
//! - `POST /v1/auth/logout`: close the session, clear the cookie
//! - `GET /v1/auth/me`: profile of the current session
//!
//! The session cookie is `rentshield_token`: HTTP-only, `SameSite=Lax`, 24
//! hours, `Secure` in production.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ApiJson,
    middleware::session::resolve_session,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use rentshield_shared::{
    auth::middleware::{clear_session_cookie, extract_session_token, session_cookie},
    models::user::UserProfile,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
///
/// Missing fields deserialize as empty and are rejected by the session
/// manager with "Email and password are required".
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(max = 320, message = "Email is too long"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 1024, message = "Password is too long"))]
    pub password: String,
}

/// Body of login and `/me` responses
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    /// Null when there is no live session
    pub user: Option<UserProfile>,
}

/// Body of logout
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Logs in and sets the session cookie
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "email": "lena@example.com", "password": "landlord-pass" }
/// ```
///
/// # Response
///
/// ```json
/// { "user": { "id": "uuid", "name": "Lena", "email": "lena@example.com", "role": "landlord", "landlordId": null } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: email or password missing
/// - `401 Unauthorized`: unknown email or wrong password
/// - `403 Forbidden`: account suspended
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let outcome = state.sessions.login(&req.email, &req.password).await?;
    let cookie = session_cookie(&outcome.token, state.secure_cookies());

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Json(UserEnvelope {
            user: Some(outcome.user),
        }),
    ))
}

/// Closes the current session, if any, and clears the cookie
///
/// Always succeeds, even without a session.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let token = extract_session_token(&headers);
    state.sessions.logout(token.as_deref()).await?;

    let cookie = clear_session_cookie(state.secure_cookies());

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Json(OkResponse { ok: true }),
    ))
}

/// Returns the current user, or `{"user": null}` with 401
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    let user = match resolve_session(&state, &headers).await? {
        Some(auth) => state.sessions.current_user(&auth).await?,
        None => None,
    };

    let status = if user.is_some() {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };

    Ok((status, Json(UserEnvelope { user })))
}
