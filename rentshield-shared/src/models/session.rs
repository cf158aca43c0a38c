//! Session model and database operations
//!
//! A session binds an opaque bearer token to a user for a fixed lifetime. Only
//! the SHA-256 hash of the token is stored; the plaintext leaves the server
//! exactly once, in the login response.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE sessions (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     role user_role NOT NULL,
//!     token_hash CHAR(64) NOT NULL UNIQUE,
//!     expires_at TIMESTAMPTZ NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserRole;

/// Authenticated session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,

    pub user_id: Uuid,

    /// Role copied from the user when the session was created
    pub role: UserRole,

    /// SHA-256 hex digest of the bearer token
    pub token_hash: String,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A session is valid strictly before its expiry instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Input for creating a session
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub role: UserRole,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Inserts a new session
    pub async fn create(pool: &PgPool, data: CreateSession) -> Result<Self, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, role, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, role, token_hash, expires_at, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.role)
        .bind(data.token_hash)
        .bind(data.expires_at)
        .fetch_one(pool)
        .await?;

        Ok(session)
    }

    /// Finds a session by token hash that has not expired at `now`
    pub async fn find_active(
        pool: &PgPool,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, role, token_hash, expires_at, created_at
            FROM sessions
            WHERE token_hash = $1 AND expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Deletes a session by token hash
    ///
    /// Returns true if a row was removed.
    pub async fn delete_by_token_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every session belonging to a user
    pub async fn delete_by_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes sessions whose expiry is at or before `now`
    pub async fn delete_expired(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
