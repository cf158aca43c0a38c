//! Task endpoints
//!
//! - `GET /v1/tasks?role=&userId=`: tasks visible to the caller, newest first,
//!   with `landlordName` and `tenantName`; the query only filters for admins
//! - `POST /v1/tasks`: landlord assigns a task to one of their tenants
//! - `GET /v1/tasks/:id`: one task, enriched

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
use chrono::{DateTime, Utc};
use rentshield_shared::{
    auth::{authorization::Operation, middleware::AuthContext},
    models::user::UserRole,
    services::tasks::{NewTask, TaskQuery, TaskView},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub role: Option<UserRole>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: TaskView,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub tenant_id: Option<Uuid>,

    pub property_id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Reward must not be negative"))]
    pub reward_amount: Option<i64>,

    /// Defaults to 14 days from now
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// Lists tasks visible to the caller
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> ApiResult<Json<TasksResponse>> {
    let query = TaskQuery {
        role: query.role,
        user_id: query.user_id,
    };

    let tasks = degrade_listing("tasks", state.tasks.list_tasks(&auth, query).await)?;
    Ok(Json(TasksResponse { tasks }))
}

/// Creates a task in `open`
///
/// # Errors
///
/// - `400 Bad Request`: empty title, missing `tenantId`, negative reward
/// - `403 Forbidden`: caller is not a landlord, or the tenant isn't theirs
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    permit(&auth, Operation::CreateTask)?;
    req.validate()?;

    if req.title.trim().is_empty() {
        return Err(ApiError::field("title", "Title is required"));
    }

    let task = state
        .tasks
        .create_task(
            &auth,
            NewTask {
                tenant_id: req.tenant_id,
                property_id: req.property_id,
                title: req.title,
                description: req.description,
                reward_amount: req.reward_amount,
                deadline: req.deadline,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: task.id })))
}

/// Fetches one task with both parties' names
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.tasks.get_task(&auth, id).await?;
    Ok(Json(TaskResponse { task }))
}
