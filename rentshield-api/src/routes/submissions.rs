//! Submission endpoints
//!
//! - `GET /v1/submissions?taskId=`: submissions visible to the caller, with
//!   `tenantName`
//! - `POST /v1/submissions`: assigned tenant submits evidence; the task moves
//!   to `submitted`
//! - `PATCH /v1/submissions/:id`: owning landlord or admin approves or
//!   rejects; the task mirrors the decision

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::{degrade_listing, permit},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use rentshield_shared::{
    auth::{authorization::Operation, middleware::AuthContext},
    services::tasks::SubmissionView,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubmissionsQuery {
    pub task_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionsResponse {
    pub submissions: Vec<SubmissionView>,
}

/// Submit evidence request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub task_id: Option<Uuid>,

    #[validate(length(max = 5000, message = "Comment must be at most 5000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionCreatedResponse {
    pub ok: bool,
    pub id: Uuid,
}

/// Decide submission request; `status` is `approved` or `rejected`
#[derive(Debug, Deserialize)]
pub struct DecideSubmissionRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Lists submissions visible to the caller, newest first
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListSubmissionsQuery>,
) -> ApiResult<Json<SubmissionsResponse>> {
    let submissions = degrade_listing(
        "submissions",
        state.tasks.list_submissions(&auth, query.task_id).await,
    )?;
    Ok(Json(SubmissionsResponse { submissions }))
}

/// Records the caller's evidence against a task
///
/// # Errors
///
/// - `400 Bad Request`: missing `taskId`
/// - `403 Forbidden`: caller isn't the task's tenant
/// - `404 Not Found`: no such task
pub async fn create_submission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateSubmissionRequest>,
) -> ApiResult<(StatusCode, Json<SubmissionCreatedResponse>)> {
    permit(&auth, Operation::SubmitEvidence)?;
    req.validate()?;

    let task_id = req
        .task_id
        .ok_or_else(|| ApiError::field("taskId", "taskId is required"))?;

    let submission = state
        .tasks
        .submit_evidence(&auth, task_id, req.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionCreatedResponse {
            ok: true,
            id: submission.id,
        }),
    ))
}

/// Approves or rejects a submission
///
/// # Errors
///
/// - `400 Bad Request`: status missing or not `approved`/`rejected`
/// - `403 Forbidden`: caller doesn't own the task
/// - `404 Not Found`: no such submission
pub async fn decide_submission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<DecideSubmissionRequest>,
) -> ApiResult<Json<OkResponse>> {
    permit(&auth, Operation::DecideSubmission)?;

    let status = req
        .status
        .ok_or_else(|| ApiError::field("status", "status is required"))?;

    state.tasks.decide_submission(&auth, id, &status).await?;

    Ok(Json(OkResponse { ok: true }))
}
