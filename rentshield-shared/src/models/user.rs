//! User model and database operations
//!
//! Users are admins, landlords, or tenants. A tenant always points back to the
//! landlord that manages them through `landlord_id`; no other role carries it.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE user_role AS ENUM ('admin', 'landlord', 'tenant');
//! CREATE TYPE user_status AS ENUM ('active', 'suspended');
//!
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(100) NOT NULL,
//!     email CITEXT NOT NULL UNIQUE,
//!     password_hash TEXT NOT NULL,
//!     role user_role NOT NULL,
//!     landlord_id UUID REFERENCES users(id),
//!     status user_status NOT NULL DEFAULT 'active',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT users_landlord_only_for_tenants
//!         CHECK ((role = 'tenant') = (landlord_id IS NOT NULL))
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Platform administrator: manages accounts, adjudicates property reviews
    Admin,

    /// Owns tasks and property reviews for their tenants
    Landlord,

    /// Completes tasks and contributes photos to reviews
    Tenant,
}

impl UserRole {
    /// Converts role to its wire/storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Landlord => "landlord",
            UserRole::Tenant => "tenant",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "landlord" => Ok(UserRole::Landlord),
            "tenant" => Ok(UserRole::Tenant),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account may log in
    Active,

    /// Account is locked out; login reports the suspension explicitly
    Suspended,
}

impl UserStatus {
    /// Converts status to its wire/storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "suspended" => Ok(UserStatus::Suspended),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// User model representing an account
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, stored trimmed and lower-cased (CITEXT in PostgreSQL)
    pub email: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Account role
    pub role: UserRole,

    /// Managing landlord; set iff `role` is tenant
    pub landlord_id: Option<Uuid>,

    /// Account status
    pub status: UserStatus,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the account is allowed to log in
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Public profile returned by login and `/auth/me`
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            landlord_id: self.landlord_id,
        }
    }
}

/// Public subset of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub landlord_id: Option<Uuid>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Normalized (trimmed, lower-cased) email
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Role of the new account
    pub role: UserRole,

    /// Managing landlord (tenants only)
    pub landlord_id: Option<Uuid>,
}

/// Filter for listing users
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFilter {
    /// Only users with this role
    pub role: Option<UserRole>,

    /// Only tenants managed by this landlord
    pub landlord_id: Option<Uuid>,
}

/// Normalizes an email for storage and lookup
///
/// Emails are unique case-insensitively, so every path that touches an email
/// goes through this function first.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint violation)
    /// - `landlord_id` does not reference an existing user
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role, landlord_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, role, landlord_id, status, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.landlord_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, landlord_id, status, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Lookup is case-insensitive via the CITEXT column type.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, landlord_id, status, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Fetches many users in a single round trip
    ///
    /// Unknown IDs are silently skipped.
    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, landlord_id, status, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Lists users matching a filter, newest first
    pub async fn list(pool: &PgPool, filter: UserFilter) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, landlord_id, status, created_at
            FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::uuid IS NULL OR landlord_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.role)
        .bind(filter.landlord_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Sets the account status
    ///
    /// Returns the updated user, or None if it doesn't exist.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: UserStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET status = $2
            WHERE id = $1
            RETURNING id, name, email, password_hash, role, landlord_id, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Counts users with a given role
    pub async fn count_by_role(pool: &PgPool, role: UserRole) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
