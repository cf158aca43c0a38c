//! Property-review endpoints
//!
//! - `GET /v1/property-reviews`: reviews visible to the caller (bare array)
//! - `POST /v1/property-reviews`: landlord opens a review for their tenant
//! - `GET /v1/property-reviews/:id`: one review, enriched with names
//! - `POST /v1/property-reviews/:id/photos`: landlord photos (multipart `files`)
//! - `POST /v1/property-reviews/:id/tenant-photos`: tenant photos (multipart `files`)
//! - `POST /v1/property-reviews/:id/verdict`: admin verdict, optional voucher

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    routes::{degrade_listing, permit},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use rentshield_shared::{
    auth::{authorization::Operation, middleware::AuthContext},
    models::property_review::PhotoSide,
    services::{
        photos::PhotoUpload,
        reviews::{NewReview, ReviewView, VerdictOutcome},
    },
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// Multipart field carrying uploaded files
const FILES_FIELD: &str = "files";

/// Open review request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub tenant_id: Option<Uuid>,

    #[validate(length(max = 5000, message = "Note must be at most 5000 characters"))]
    pub landlord_note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCreatedResponse {
    pub property_review_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploaded: usize,
}

/// Verdict request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRequest {
    /// `thumbs_up` or `thumbs_down`
    pub verdict: Option<String>,

    /// Voucher to issue on `thumbs_up`, e.g. `amazon_10`
    pub voucher_type: Option<String>,
}

/// Lists reviews visible to the caller, newest first
pub async fn list_reviews(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ReviewView>>> {
    let reviews = degrade_listing("property_reviews", state.reviews.list_reviews(&auth).await)?;
    Ok(Json(reviews))
}

/// Opens a review in `pending_admin_review`
///
/// # Errors
///
/// - `400 Bad Request`: missing or non-tenant `tenantId`
/// - `403 Forbidden`: caller is not a landlord, or the tenant isn't theirs
pub async fn create_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewCreatedResponse>)> {
    permit(&auth, Operation::CreateReview)?;
    req.validate()?;

    let review = state
        .reviews
        .create_review(
            &auth,
            NewReview {
                tenant_id: req.tenant_id,
                landlord_note: req.landlord_note,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewCreatedResponse {
            property_review_id: review.id,
        }),
    ))
}

/// Fetches one review
pub async fn get_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ReviewView>> {
    Ok(Json(state.reviews.get_review(&auth, id).await?))
}

/// Appends the owning landlord's photos
pub async fn upload_landlord_photos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload(state, auth, id, PhotoSide::Landlord, multipart).await
}

/// Appends the named tenant's photos
pub async fn upload_tenant_photos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload(state, auth, id, PhotoSide::Tenant, multipart).await
}

async fn upload(
    state: AppState,
    auth: AuthContext,
    id: Uuid,
    side: PhotoSide,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let uploads = read_files(multipart).await?;
    debug!(review_id = %id, side = side.as_str(), files = uploads.len(), "Photo upload received");

    let uploaded = state.reviews.append_photos(&auth, id, side, uploads).await?;
    Ok(Json(UploadResponse { uploaded }))
}

/// Collects every `files` part; other parts are ignored
async fn read_files(mut multipart: Multipart) -> Result<Vec<PhotoUpload>, ApiError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        uploads.push(PhotoUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    Ok(uploads)
}

/// Renders the admin verdict
///
/// # Response
///
/// ```json
/// { "status": "approved", "adminVerdict": "thumbs_up", "voucherId": "uuid" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: verdict missing or unknown
/// - `403 Forbidden`: caller is not an admin
/// - `404 Not Found`: no such review
/// - `409 Conflict`: review already decided
pub async fn render_verdict(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<VerdictRequest>,
) -> ApiResult<Json<VerdictOutcome>> {
    permit(&auth, Operation::RenderVerdict)?;

    let verdict = req
        .verdict
        .ok_or_else(|| ApiError::field("verdict", "verdict is required"))?;

    let outcome = state
        .reviews
        .render_verdict(&auth, id, &verdict, req.voucher_type.as_deref())
        .await?;

    Ok(Json(outcome))
}
