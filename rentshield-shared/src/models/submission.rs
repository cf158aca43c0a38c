//! Submission model and database operations
//!
//! A submission is a tenant's evidence against a task. Creating one and
//! deciding one both touch the parent task, so each runs in a single
//! transaction.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE submission_status AS ENUM ('pending', 'approved', 'rejected');
//!
//! CREATE TABLE submissions (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
//!     tenant_id UUID NOT NULL REFERENCES users(id),
//!     comment TEXT NOT NULL DEFAULT '',
//!     status submission_status NOT NULL DEFAULT 'pending',
//!     reviewed_by UUID REFERENCES users(id),
//!     reviewed_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use super::task::{Task, TaskStatus};

/// Submission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

/// A landlord's decision on a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// Status the submission takes on
    pub fn submission_status(&self) -> SubmissionStatus {
        match self {
            Decision::Approved => SubmissionStatus::Approved,
            Decision::Rejected => SubmissionStatus::Rejected,
        }
    }

    /// Status the parent task mirrors
    pub fn task_status(&self) -> TaskStatus {
        match self {
            Decision::Approved => TaskStatus::Approved,
            Decision::Rejected => TaskStatus::Rejected,
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Decision::Approved),
            "rejected" => Ok(Decision::Rejected),
            _ => Err("status must be 'approved' or 'rejected'".to_string()),
        }
    }
}

/// Submission model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub task_id: Uuid,
    pub tenant_id: Uuid,
    pub comment: String,
    pub status: SubmissionStatus,

    /// Landlord or admin who decided the submission
    pub reviewed_by: Option<Uuid>,

    pub reviewed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a submission
#[derive(Debug, Clone)]
pub struct CreateSubmission {
    pub task_id: Uuid,
    pub tenant_id: Uuid,
    pub comment: String,
}

/// Decision applied to a submission
#[derive(Debug, Clone, Copy)]
pub struct DecideSubmission {
    pub decision: Decision,
    pub reviewed_by: Uuid,
    pub reviewed_at: DateTime<Utc>,
}

/// Filter for listing submissions
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionFilter {
    pub task_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,

    /// Only submissions on tasks owned by this landlord
    pub landlord_id: Option<Uuid>,
}

impl Submission {
    /// Creates a pending submission and moves the parent task to `submitted`
    ///
    /// Both writes happen in one transaction. The task status is overwritten
    /// whatever it was before. Returns None if the task doesn't exist.
    pub async fn create(
        pool: &PgPool,
        data: CreateSubmission,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !Task::set_status(&mut tx, data.task_id, TaskStatus::Submitted).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (task_id, tenant_id, comment)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, tenant_id, comment, status, reviewed_by, reviewed_at, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.tenant_id)
        .bind(data.comment)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(submission))
    }

    /// Finds a submission by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, task_id, tenant_id, comment, status, reviewed_by, reviewed_at, created_at
            FROM submissions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(submission)
    }

    /// Lists submissions matching a filter, newest first
    pub async fn list(pool: &PgPool, filter: SubmissionFilter) -> Result<Vec<Self>, sqlx::Error> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT s.id, s.task_id, s.tenant_id, s.comment, s.status,
                   s.reviewed_by, s.reviewed_at, s.created_at
            FROM submissions s
            JOIN tasks t ON t.id = s.task_id
            WHERE ($1::uuid IS NULL OR s.task_id = $1)
              AND ($2::uuid IS NULL OR s.tenant_id = $2)
              AND ($3::uuid IS NULL OR t.landlord_id = $3)
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(filter.task_id)
        .bind(filter.tenant_id)
        .bind(filter.landlord_id)
        .fetch_all(pool)
        .await?;

        Ok(submissions)
    }

    /// Records a decision and mirrors it onto the parent task
    ///
    /// Last decision wins: the task takes the decided status even if other
    /// submissions on it are still pending. Returns None if the submission
    /// doesn't exist.
    pub async fn decide(
        pool: &PgPool,
        id: Uuid,
        data: DecideSubmission,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = $2, reviewed_by = $3, reviewed_at = $4
            WHERE id = $1
            RETURNING id, task_id, tenant_id, comment, status, reviewed_by, reviewed_at, created_at
            "#,
        )
        .bind(id)
        .bind(data.decision.submission_status())
        .bind(data.reviewed_by)
        .bind(data.reviewed_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(submission) = submission else {
            tx.rollback().await?;
            return Ok(None);
        };

        Task::set_status(&mut tx, submission.task_id, data.decision.task_status()).await?;

        tx.commit().await?;
        Ok(Some(submission))
    }
}
