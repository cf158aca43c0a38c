//! Voucher model and database operations
//!
//! Vouchers are issued to a tenant when an admin approves a property review.
//! They are only ever inserted together with the verdict that issues them
//! (see [`PropertyReview::apply_verdict`](super::property_review::PropertyReview::apply_verdict)).
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE vouchers (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     tenant_id UUID NOT NULL REFERENCES users(id),
//!     property_review_id UUID NOT NULL UNIQUE REFERENCES property_reviews(id),
//!     voucher_type VARCHAR(50) NOT NULL,
//!     voucher_type_label VARCHAR(100) NOT NULL,
//!     voucher_code CHAR(16) NOT NULL UNIQUE,
//!     issued_by_id UUID NOT NULL REFERENCES users(id),
//!     issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     status voucher_status NOT NULL DEFAULT 'active'
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Voucher status (no redemption lifecycle is modelled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "voucher_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Active,
}

/// Voucher model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub property_review_id: Uuid,

    /// Catalogue key, e.g. `amazon_10`
    pub voucher_type: String,

    /// Human-readable label, e.g. "Amazon £10"
    pub voucher_type_label: String,

    /// Redeemable code: 16 uppercase hex characters
    pub voucher_code: String,

    /// Admin who issued the voucher
    pub issued_by_id: Uuid,

    pub issued_at: DateTime<Utc>,

    pub status: VoucherStatus,
}

/// Input for issuing a voucher
#[derive(Debug, Clone)]
pub struct CreateVoucher {
    pub tenant_id: Uuid,
    pub property_review_id: Uuid,
    pub voucher_type: String,
    pub voucher_type_label: String,
    pub voucher_code: String,
    pub issued_by_id: Uuid,
}

/// Filter for listing vouchers
#[derive(Debug, Clone, Copy, Default)]
pub struct VoucherFilter {
    pub tenant_id: Option<Uuid>,
}

impl Voucher {
    /// Inserts a voucher inside an open transaction
    pub(crate) async fn insert(
        conn: &mut sqlx::PgConnection,
        data: CreateVoucher,
    ) -> Result<Self, sqlx::Error> {
        let voucher = sqlx::query_as::<_, Voucher>(
            r#"
            INSERT INTO vouchers (tenant_id, property_review_id, voucher_type,
                                  voucher_type_label, voucher_code, issued_by_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, property_review_id, voucher_type, voucher_type_label,
                      voucher_code, issued_by_id, issued_at, status
            "#,
        )
        .bind(data.tenant_id)
        .bind(data.property_review_id)
        .bind(data.voucher_type)
        .bind(data.voucher_type_label)
        .bind(data.voucher_code)
        .bind(data.issued_by_id)
        .fetch_one(conn)
        .await?;

        Ok(voucher)
    }

    /// Lists vouchers matching a filter, most recently issued first
    pub async fn list(pool: &PgPool, filter: VoucherFilter) -> Result<Vec<Self>, sqlx::Error> {
        let vouchers = sqlx::query_as::<_, Voucher>(
            r#"
            SELECT id, tenant_id, property_review_id, voucher_type, voucher_type_label,
                   voucher_code, issued_by_id, issued_at, status
            FROM vouchers
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
            ORDER BY issued_at DESC
            "#,
        )
        .bind(filter.tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(vouchers)
    }
}
