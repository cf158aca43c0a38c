//! Request authentication context and session cookie handling
//!
//! The API's session layer resolves a token into an [`AuthContext`] and
//! inserts it into request extensions; handlers pull it back out with
//! `Extension<AuthContext>`.
//!
//! Tokens are read from the `rentshield_token` cookie first and from an
//! `Authorization: Bearer` header second.

use axum::http::{header, HeaderMap};
use cookie::{time::Duration, Cookie, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "rentshield_token";

/// Fixed lifetime of a session, in hours
pub const SESSION_TTL_HOURS: i64 = 24;

/// Authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Role recorded on the session at login
    pub role: UserRole,

    pub session_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: UserRole, session_id: Uuid) -> Self {
        Self {
            user_id,
            role,
            session_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Extracts the raw session token from a request's headers
///
/// The cookie wins when both are present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Builds the `Set-Cookie` value that stores a new session token
///
/// HTTP-only, `SameSite=Lax`, path `/`, 24-hour max age; `Secure` when
/// `secure` is set.
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::hours(SESSION_TTL_HOURS))
        .secure(secure)
        .build()
}

/// Builds the `Set-Cookie` value that clears the session cookie
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; rentshield_token=abc123; other=1"),
        );

        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok_456"),
        );

        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok_456"));
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("rentshield_token=fromcookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer frombearer"));

        assert_eq!(extract_session_token(&headers).as_deref(), Some("fromcookie"));
    }

    #[test]
    fn test_extract_missing() {
        let mut headers = HeaderMap::new();
        assert!(extract_session_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_session_token(&headers).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let rendered = session_cookie("abc", false).to_string();

        assert!(rendered.starts_with("rentshield_token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=86400"));
        assert!(!rendered.contains("Secure"));

        assert!(session_cookie("abc", true).to_string().contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let rendered = clear_session_cookie(false).to_string();

        assert!(rendered.starts_with("rentshield_token=;"));
        assert!(rendered.contains("Max-Age=0"));
    }
}
