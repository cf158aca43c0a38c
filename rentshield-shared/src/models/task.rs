//! Task model and database operations
//!
//! A task is a reward-bearing action item a landlord assigns to one of their
//! tenants. Its status only moves through the submission lifecycle.
//!
//! # State Machine
//!
//! ```text
//! open ──submit──▶ submitted ──decide──▶ approved
//!                      ▲        └──────▶ rejected
//!                      └── submit (any status, last write wins)
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_status AS ENUM ('open', 'submitted', 'approved', 'rejected');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     landlord_id UUID NOT NULL REFERENCES users(id),
//!     tenant_id UUID NOT NULL REFERENCES users(id),
//!     property_id UUID,
//!     title VARCHAR(200) NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     reward_amount INTEGER NOT NULL DEFAULT 0 CHECK (reward_amount >= 0),
//!     deadline TIMESTAMPTZ NOT NULL,
//!     status task_status NOT NULL DEFAULT 'open',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default time a tenant gets to complete a task
pub const DEFAULT_DEADLINE_DAYS: i64 = 14;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for the tenant
    Open,

    /// Tenant has submitted evidence; awaiting a decision
    Submitted,

    /// Latest submission was approved
    Approved,

    /// Latest submission was rejected
    Rejected,
}

impl TaskStatus {
    /// Converts status to its wire/storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Submitted => "submitted",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    /// Owning landlord
    pub landlord_id: Uuid,

    /// Assigned tenant
    pub tenant_id: Uuid,

    /// Optional property reference (opaque to this service)
    pub property_id: Option<Uuid>,

    pub title: String,

    pub description: String,

    /// Reward in whole currency units
    pub reward_amount: i32,

    pub deadline: DateTime<Utc>,

    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub landlord_id: Uuid,
    pub tenant_id: Uuid,
    pub property_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub reward_amount: i32,
    pub deadline: DateTime<Utc>,
}

/// Deadline used when the landlord doesn't pick one
pub fn default_deadline(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(DEFAULT_DEADLINE_DAYS)
}

/// Filter for listing tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub landlord_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
}

impl Task {
    /// Creates a new task in `open` state
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (landlord_id, tenant_id, property_id, title, description,
                               reward_amount, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, landlord_id, tenant_id, property_id, title, description,
                      reward_amount, deadline, status, created_at
            "#,
        )
        .bind(data.landlord_id)
        .bind(data.tenant_id)
        .bind(data.property_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.reward_amount)
        .bind(data.deadline)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, landlord_id, tenant_id, property_id, title, description,
                   reward_amount, deadline, status, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks matching a filter, newest first
    pub async fn list(pool: &PgPool, filter: TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, landlord_id, tenant_id, property_id, title, description,
                   reward_amount, deadline, status, created_at
            FROM tasks
            WHERE ($1::uuid IS NULL OR landlord_id = $1)
              AND ($2::uuid IS NULL OR tenant_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.landlord_id)
        .bind(filter.tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts tasks in a given status
    pub async fn count_by_status(pool: &PgPool, status: TaskStatus) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Overwrites the status of a task inside an open transaction
    ///
    /// Returns false when the task doesn't exist.
    pub(crate) async fn set_status(
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tasks SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
