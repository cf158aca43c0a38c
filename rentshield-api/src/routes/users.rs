//! User administration endpoints
//!
//! - `GET /v1/users?role=`: admins list any role (landlords by default);
//!   landlords may list `role=tenant` and get their own tenants
//! - `POST /v1/users`: admin creates a landlord or tenant
//! - `GET /v1/users/:id`: admin fetches one account
//! - `PATCH /v1/users/:id/status`: admin activates or suspends an account

use crate::{
    app::AppState,
    error::ApiResult,
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
    models::user::{User, UserRole, UserStatus},
    services::identity::NewUser,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Create user request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Defaults to landlord
    pub role: Option<UserRole>,

    /// Required for tenants
    pub landlord_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: UserStatus,
}

/// Lists accounts, newest first
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> ApiResult<Json<UsersResponse>> {
    let users = degrade_listing("users", state.identity.list_users(&auth, query.role).await)?;
    Ok(Json(UsersResponse { users }))
}

/// Creates a landlord or tenant account
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or a bad `landlordId`
/// - `403 Forbidden`: caller is not an admin
/// - `409 Conflict`: email already registered
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    permit(&auth, Operation::ManageUsers)?;
    req.validate()?;

    let user = state
        .identity
        .create_user(
            &auth,
            NewUser {
                name: req.name,
                email: req.email,
                password: req.password,
                role: req.role,
                landlord_id: req.landlord_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: user.id })))
}

/// Fetches one account
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.identity.get_user(&auth, id).await?;
    Ok(Json(UserResponse { user }))
}

/// Activates or suspends an account; suspension ends its sessions
pub async fn set_user_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SetStatusRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.identity.set_status(&auth, id, req.status).await?;
    Ok(Json(UserResponse { user }))
}
