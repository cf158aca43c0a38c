//! Voucher listing
//!
//! ```text
//! GET /v1/vouchers
//! ```
//!
//! Admins see every voucher, tenants their own, landlords an empty list.

use crate::{app::AppState, error::ApiResult, routes::degrade_listing};
use axum::{extract::State, Extension, Json};
use rentshield_shared::{auth::middleware::AuthContext, models::voucher::Voucher};

/// Lists vouchers visible to the caller, most recent first (bare array)
pub async fn list_vouchers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Voucher>>> {
    let vouchers = degrade_listing("vouchers", state.reviews.list_vouchers(&auth).await)?;
    Ok(Json(vouchers))
}
