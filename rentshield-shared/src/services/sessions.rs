//! Session manager: login, token resolution, logout
//!
//! Login issues a 24-hour session keyed by the SHA-256 hash of a random
//! token. Resolution is passive: an expired session is simply never found.
//! Expired rows are removed by [`SessionManager::sweep_expired`], which the
//! API runs periodically.

use chrono::{DateTime, Duration, Utc};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::auth::{
    middleware::{AuthContext, SESSION_TTL_HOURS},
    password::{hash_password, verify_password},
    session_token::{generate_session_token, hash_session_token, is_well_formed},
};
use crate::models::{
    session::CreateSession,
    user::{normalize_email, UserProfile},
};
use crate::store::SharedStore;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Argon2 hash verified when the email is unknown, so both failure paths
/// cost one verification
fn unknown_user_hash() -> Option<&'static str> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| hash_password("rentshield-unknown-user").ok())
        .as_deref()
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserProfile,

    /// Plaintext token; returned to the client once and never stored
    pub token: String,

    pub expires_at: DateTime<Utc>,
}

/// Issues, resolves, and revokes sessions
#[derive(Clone)]
pub struct SessionManager {
    store: SharedStore,
}

impl SessionManager {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Authenticates by email and password and opens a session
    ///
    /// # Errors
    ///
    /// - `Validation` if either field is blank
    /// - `Unauthorized` if the email is unknown or the password is wrong
    /// - `Forbidden` if the account is suspended (checked after the password,
    ///   so account state is only revealed to someone holding the password)
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            if let Some(hash) = unknown_user_hash() {
                let _ = verify_password(password, hash);
            }
            debug!("Login for unknown email");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active() {
            warn!(user_id = %user.id, "Login attempt on suspended account");
            return Err(ServiceError::Forbidden("Account suspended".to_string()));
        }

        let (token, token_hash) = generate_session_token();
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);

        let session = self
            .store
            .insert_session(CreateSession {
                user_id: user.id,
                role: user.role,
                token_hash,
                expires_at,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, session_id = %session.id, "User logged in");

        Ok(LoginOutcome {
            user: user.profile(),
            token,
            expires_at,
        })
    }

    /// Resolves a token to the caller, if it names a live session
    pub async fn resolve(&self, token: &str) -> ServiceResult<Option<AuthContext>> {
        if !is_well_formed(token) {
            return Ok(None);
        }

        let session = self
            .store
            .find_session(&hash_session_token(token), Utc::now())
            .await?;

        Ok(session.map(|s| AuthContext::new(s.user_id, s.role, s.id)))
    }

    /// Profile of the authenticated caller
    ///
    /// None if the user row has disappeared since login.
    pub async fn current_user(&self, auth: &AuthContext) -> ServiceResult<Option<UserProfile>> {
        Ok(self
            .store
            .find_user(auth.user_id)
            .await?
            .map(|user| user.profile()))
    }

    /// Deletes the session for `token`, if any
    ///
    /// Idempotent: an unknown, malformed, or absent token is not an error.
    pub async fn logout(&self, token: Option<&str>) -> ServiceResult<()> {
        let Some(token) = token.filter(|t| is_well_formed(t)) else {
            return Ok(());
        };

        if self.store.delete_session(&hash_session_token(token)).await? {
            info!("Session closed");
        }

        Ok(())
    }

    /// Revokes every session of a user
    pub async fn revoke_user(&self, user_id: Uuid) -> ServiceResult<u64> {
        let revoked = self.store.delete_user_sessions(user_id).await?;
        if revoked > 0 {
            info!(user_id = %user_id, revoked, "Revoked user sessions");
        }
        Ok(revoked)
    }

    /// Deletes sessions that have expired
    pub async fn sweep_expired(&self) -> ServiceResult<u64> {
        let removed = self.store.delete_expired_sessions(Utc::now()).await?;
        debug!(removed, "Expired sessions swept");
        Ok(removed)
    }
}
