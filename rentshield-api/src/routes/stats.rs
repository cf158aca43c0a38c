//! Admin dashboard counters
//!
//! ```text
//! GET /v1/stats
//! ```
//!
//! ```json
//! { "landlords": 3, "tenants": 12, "openTasks": 5 }
//! ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use rentshield_shared::{
    auth::middleware::AuthContext,
    services::identity::DashboardStats,
};
use tracing::warn;

/// Counts of landlords, tenants and open tasks; zeros when storage fails
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardStats>> {
    match state.identity.stats(&auth).await {
        Ok(stats) => Ok(Json(stats)),
        Err(err) if err.is_dependency() => {
            warn!(error = %err, "Stats degraded to zeros");
            Ok(Json(DashboardStats::default()))
        }
        Err(err) => Err(err.into()),
    }
}
