//! Property review model and database operations
//!
//! A property review is a landlord-initiated record of a property's condition.
//! Both the landlord and the named tenant attach photos; an admin then renders
//! a single verdict, which may issue a voucher to the tenant.
//!
//! # State Machine
//!
//! ```text
//! pending_admin_review ──thumbs_up──▶ approved   (+ optional voucher)
//!                      └─thumbs_down─▶ rejected
//! ```
//!
//! Both outcomes are terminal. Every write is conditional on the review still
//! being `pending_admin_review`, so two admins racing cannot both win.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE review_status AS ENUM ('pending_admin_review', 'approved', 'rejected');
//! CREATE TYPE review_verdict AS ENUM ('thumbs_up', 'thumbs_down');
//!
//! CREATE TABLE property_reviews (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     tenant_id UUID NOT NULL REFERENCES users(id),
//!     landlord_id UUID NOT NULL REFERENCES users(id),
//!     landlord_note TEXT,
//!     landlord_photos JSONB NOT NULL DEFAULT '[]',
//!     tenant_photos JSONB NOT NULL DEFAULT '[]',
//!     status review_status NOT NULL DEFAULT 'pending_admin_review',
//!     admin_verdict review_verdict,
//!     voucher_id UUID,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use super::voucher::{CreateVoucher, Voucher};

/// Review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    PendingAdminReview,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::PendingAdminReview => "pending_admin_review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// Whether photos and a verdict may still be recorded
    pub fn is_pending(&self) -> bool {
        matches!(self, ReviewStatus::PendingAdminReview)
    }
}

/// Admin verdict on a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_verdict", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    ThumbsUp,
    ThumbsDown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::ThumbsUp => "thumbs_up",
            Verdict::ThumbsDown => "thumbs_down",
        }
    }

    /// Status the review ends in
    pub fn resulting_status(&self) -> ReviewStatus {
        match self {
            Verdict::ThumbsUp => ReviewStatus::Approved,
            Verdict::ThumbsDown => ReviewStatus::Rejected,
        }
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thumbs_up" => Ok(Verdict::ThumbsUp),
            "thumbs_down" => Ok(Verdict::ThumbsDown),
            _ => Err("verdict must be 'thumbs_up' or 'thumbs_down'".to_string()),
        }
    }
}

/// Which party's photo list an upload goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSide {
    Landlord,
    Tenant,
}

impl PhotoSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoSide::Landlord => "landlord",
            PhotoSide::Tenant => "tenant",
        }
    }
}

/// One uploaded photo reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Uuid,
}

/// Property review model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyReview {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub landlord_note: Option<String>,

    /// Append-only, in upload order
    pub landlord_photos: Vec<Photo>,

    /// Append-only, in upload order
    pub tenant_photos: Vec<Photo>,

    pub status: ReviewStatus,
    pub admin_verdict: Option<Verdict>,
    pub voucher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PropertyReview {
    /// Photos for one side of the review
    pub fn photos(&self, side: PhotoSide) -> &[Photo] {
        match side {
            PhotoSide::Landlord => &self.landlord_photos,
            PhotoSide::Tenant => &self.tenant_photos,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PropertyReviewRow {
    id: Uuid,
    tenant_id: Uuid,
    landlord_id: Uuid,
    landlord_note: Option<String>,
    landlord_photos: Json<Vec<Photo>>,
    tenant_photos: Json<Vec<Photo>>,
    status: ReviewStatus,
    admin_verdict: Option<Verdict>,
    voucher_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyReviewRow> for PropertyReview {
    fn from(row: PropertyReviewRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            landlord_id: row.landlord_id,
            landlord_note: row.landlord_note,
            landlord_photos: row.landlord_photos.0,
            tenant_photos: row.tenant_photos.0,
            status: row.status,
            admin_verdict: row.admin_verdict,
            voucher_id: row.voucher_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a review
#[derive(Debug, Clone)]
pub struct CreatePropertyReview {
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub landlord_note: Option<String>,
}

/// Filter for listing reviews
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewFilter {
    pub landlord_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
}

impl PropertyReview {
    /// Creates a review in `pending_admin_review` with no photos
    pub async fn create(pool: &PgPool, data: CreatePropertyReview) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, PropertyReviewRow>(
            r#"
            INSERT INTO property_reviews (tenant_id, landlord_id, landlord_note)
            VALUES ($1, $2, $3)
            RETURNING id, tenant_id, landlord_id, landlord_note, landlord_photos, tenant_photos,
                      status, admin_verdict, voucher_id, created_at, updated_at
            "#,
        )
        .bind(data.tenant_id)
        .bind(data.landlord_id)
        .bind(data.landlord_note)
        .fetch_one(pool)
        .await?;

        Ok(row.into())
    }

    /// Finds a review by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, PropertyReviewRow>(
            r#"
            SELECT id, tenant_id, landlord_id, landlord_note, landlord_photos, tenant_photos,
                   status, admin_verdict, voucher_id, created_at, updated_at
            FROM property_reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Current status of a review, if it exists
    pub async fn find_status(pool: &PgPool, id: Uuid) -> Result<Option<ReviewStatus>, sqlx::Error> {
        let status: Option<(ReviewStatus,)> =
            sqlx::query_as("SELECT status FROM property_reviews WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(status.map(|(s,)| s))
    }

    /// Lists reviews matching a filter, newest first
    pub async fn list(pool: &PgPool, filter: ReviewFilter) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, PropertyReviewRow>(
            r#"
            SELECT id, tenant_id, landlord_id, landlord_note, landlord_photos, tenant_photos,
                   status, admin_verdict, voucher_id, created_at, updated_at
            FROM property_reviews
            WHERE ($1::uuid IS NULL OR landlord_id = $1)
              AND ($2::uuid IS NULL OR tenant_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.landlord_id)
        .bind(filter.tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Appends photos to one side of a pending review
    ///
    /// Uses JSONB concatenation so concurrent appends from the other party are
    /// never overwritten. Returns None if the review doesn't exist or is no
    /// longer pending.
    pub async fn append_photos(
        pool: &PgPool,
        id: Uuid,
        side: PhotoSide,
        photos: &[Photo],
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = match side {
            PhotoSide::Landlord => {
                r#"
                UPDATE property_reviews
                SET landlord_photos = landlord_photos || $2, updated_at = NOW()
                WHERE id = $1 AND status = 'pending_admin_review'
                RETURNING id, tenant_id, landlord_id, landlord_note, landlord_photos, tenant_photos,
                          status, admin_verdict, voucher_id, created_at, updated_at
                "#
            }
            PhotoSide::Tenant => {
                r#"
                UPDATE property_reviews
                SET tenant_photos = tenant_photos || $2, updated_at = NOW()
                WHERE id = $1 AND status = 'pending_admin_review'
                RETURNING id, tenant_id, landlord_id, landlord_note, landlord_photos, tenant_photos,
                          status, admin_verdict, voucher_id, created_at, updated_at
                "#
            }
        };

        let row = sqlx::query_as::<_, PropertyReviewRow>(query)
            .bind(id)
            .bind(Json(photos))
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Applies an admin verdict, issuing a voucher in the same transaction
    ///
    /// The status update only matches a review that is still pending; if it
    /// matches nothing the transaction is rolled back and None is returned.
    pub async fn apply_verdict(
        pool: &PgPool,
        id: Uuid,
        verdict: Verdict,
        voucher: Option<CreateVoucher>,
    ) -> Result<Option<(Self, Option<Voucher>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query_as::<_, PropertyReviewRow>(
            r#"
            UPDATE property_reviews
            SET status = $2, admin_verdict = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending_admin_review'
            RETURNING id, tenant_id, landlord_id, landlord_note, landlord_photos, tenant_photos,
                      status, admin_verdict, voucher_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(verdict.resulting_status())
        .bind(verdict)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let Some(voucher) = voucher else {
            tx.commit().await?;
            return Ok(Some((row.into(), None)));
        };

        let voucher = Voucher::insert(&mut tx, voucher).await?;

        let row = sqlx::query_as::<_, PropertyReviewRow>(
            r#"
            UPDATE property_reviews
            SET voucher_id = $2
            WHERE id = $1
            RETURNING id, tenant_id, landlord_id, landlord_note, landlord_photos, tenant_photos,
                      status, admin_verdict, voucher_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(voucher.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((row.into(), Some(voucher))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_parsing() {
        assert_eq!("thumbs_up".parse::<Verdict>().unwrap(), Verdict::ThumbsUp);
        assert_eq!("thumbs_down".parse::<Verdict>().unwrap(), Verdict::ThumbsDown);
        assert!("meh".parse::<Verdict>().is_err());
    }

    #[test]
    fn test_verdict_resulting_status() {
        assert_eq!(Verdict::ThumbsUp.resulting_status(), ReviewStatus::Approved);
        assert_eq!(Verdict::ThumbsDown.resulting_status(), ReviewStatus::Rejected);
    }

    #[test]
    fn test_review_status_serializes_snake_case() {
        let json = serde_json::to_string(&ReviewStatus::PendingAdminReview).unwrap();
        assert_eq!(json, "\"pending_admin_review\"");
        assert!(ReviewStatus::PendingAdminReview.is_pending());
        assert!(!ReviewStatus::Approved.is_pending());
    }
}
