//! Identity: user administration and display-name lookup
//!
//! [`IdentityLookup`] is the batch name-resolution capability the task and
//! review engines use to enrich listings; [`IdentityService`] implements it
//! over the store and also carries the admin-only account operations.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidateEmail;

use super::error::{ServiceError, ServiceResult};
use super::sessions::SessionManager;
use crate::auth::{
    authorization::{require, Operation},
    middleware::AuthContext,
    password::{hash_password, validate_password},
};
use crate::models::{
    task::TaskStatus,
    user::{normalize_email, CreateUser, User, UserFilter, UserRole, UserStatus},
};
use crate::store::{SharedStore, USERS_EMAIL_KEY};

/// Shown in place of a name that couldn't be resolved
pub const NAME_PLACEHOLDER: &str = "—";

/// Batch resolution of user ids to display names
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Names for every known id in `ids`; unknown ids are absent from the map
    async fn display_names(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>>;
}

/// Name for `id`, or the placeholder
pub fn name_or_placeholder(names: &HashMap<Uuid, String>, id: Uuid) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| NAME_PLACEHOLDER.to_string())
}

/// Input for creating an account
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,

    /// Defaults to landlord
    pub role: Option<UserRole>,

    /// Required for tenants, rejected for everyone else
    pub landlord_id: Option<Uuid>,
}

/// Admin dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub landlords: i64,
    pub tenants: i64,
    pub open_tasks: i64,
}

/// Account administration over the store
#[derive(Clone)]
pub struct IdentityService {
    store: SharedStore,
    sessions: SessionManager,
}

#[async_trait]
impl IdentityLookup for IdentityService {
    async fn display_names(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, String>> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let users = self.store.find_users(&unique).await?;
        Ok(users.into_iter().map(|u| (u.id, u.name)).collect())
    }
}

impl IdentityService {
    pub fn new(store: SharedStore, sessions: SessionManager) -> Self {
        Self { store, sessions }
    }

    /// Creates a landlord or tenant account
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the caller is an admin
    /// - `Validation` for a blank name, malformed email, short password, an
    ///   admin role, or a landlord reference that is missing, misplaced, or
    ///   doesn't name a landlord
    /// - `Conflict` if the email is already registered
    pub async fn create_user(&self, actor: &AuthContext, input: NewUser) -> ServiceResult<User> {
        require(actor, Operation::ManageUsers)?;

        let role = input.role.unwrap_or(UserRole::Landlord);
        if role == UserRole::Admin {
            return Err(ServiceError::Validation(
                "role must be 'landlord' or 'tenant'".to_string(),
            ));
        }

        let landlord_id = match (role, input.landlord_id) {
            (UserRole::Tenant, Some(landlord_id)) => {
                self.require_landlord(landlord_id).await?;
                Some(landlord_id)
            }
            (UserRole::Tenant, None) => {
                return Err(ServiceError::Validation(
                    "landlordId is required for tenants".to_string(),
                ))
            }
            (_, Some(_)) => {
                return Err(ServiceError::Validation(
                    "landlordId is only allowed for tenants".to_string(),
                ))
            }
            (_, None) => None,
        };

        let user = self
            .insert(input.name, input.email, input.password, role, landlord_id)
            .await?;

        info!(user_id = %user.id, role = %user.role, created_by = %actor.user_id, "User created");
        Ok(user)
    }

    /// Lists accounts, newest first
    ///
    /// Admins list any role (landlords when `role` is omitted). A landlord may
    /// only ask for `role=tenant` and gets their own tenants.
    pub async fn list_users(
        &self,
        actor: &AuthContext,
        role: Option<UserRole>,
    ) -> ServiceResult<Vec<User>> {
        let role = role.unwrap_or(UserRole::Landlord);

        let filter = if actor.is_admin() {
            UserFilter {
                role: Some(role),
                landlord_id: None,
            }
        } else {
            require(actor, Operation::ListOwnTenants)?;
            if role != UserRole::Tenant {
                return Err(ServiceError::Forbidden(
                    "Landlords may only list their own tenants".to_string(),
                ));
            }
            UserFilter {
                role: Some(UserRole::Tenant),
                landlord_id: Some(actor.user_id),
            }
        };

        Ok(self.store.list_users(filter).await?)
    }

    /// Fetches one account
    pub async fn get_user(&self, actor: &AuthContext, id: Uuid) -> ServiceResult<User> {
        require(actor, Operation::ManageUsers)?;

        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    /// Activates or suspends an account
    ///
    /// Suspending revokes every open session of the user. Admins cannot
    /// suspend themselves.
    pub async fn set_status(
        &self,
        actor: &AuthContext,
        id: Uuid,
        status: UserStatus,
    ) -> ServiceResult<User> {
        require(actor, Operation::ManageUsers)?;

        if id == actor.user_id && status == UserStatus::Suspended {
            return Err(ServiceError::Validation(
                "Admins cannot suspend their own account".to_string(),
            ));
        }

        let user = self
            .store
            .set_user_status(id, status)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        if status == UserStatus::Suspended {
            self.sessions.revoke_user(id).await?;
        }

        info!(user_id = %id, status = status.as_str(), changed_by = %actor.user_id, "User status changed");
        Ok(user)
    }

    /// Counts for the admin dashboard
    pub async fn stats(&self, actor: &AuthContext) -> ServiceResult<DashboardStats> {
        require(actor, Operation::ViewStats)?;

        Ok(DashboardStats {
            landlords: self.store.count_users(UserRole::Landlord).await?,
            tenants: self.store.count_users(UserRole::Tenant).await?,
            open_tasks: self.store.count_tasks(TaskStatus::Open).await?,
        })
    }

    /// Creates the first admin account if no admin exists yet
    ///
    /// Returns the new admin, or None when one already exists. Not subject to
    /// authorization: it runs once at startup from configuration.
    pub async fn bootstrap_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<Option<User>> {
        if self.store.count_users(UserRole::Admin).await? > 0 {
            return Ok(None);
        }

        let admin = self
            .insert(
                name.to_string(),
                email.to_string(),
                password.to_string(),
                UserRole::Admin,
                None,
            )
            .await?;

        info!(user_id = %admin.id, "Bootstrap admin created");
        Ok(Some(admin))
    }

    async fn require_landlord(&self, landlord_id: Uuid) -> ServiceResult<()> {
        match self.store.find_user(landlord_id).await? {
            Some(user) if user.role == UserRole::Landlord => Ok(()),
            _ => Err(ServiceError::Validation(
                "landlordId must reference a landlord".to_string(),
            )),
        }
    }

    async fn insert(
        &self,
        name: String,
        email: String,
        password: String,
        role: UserRole,
        landlord_id: Option<Uuid>,
    ) -> ServiceResult<User> {
        let name = name.trim().to_string();
        let email = normalize_email(&email);

        if name.is_empty() || email.is_empty() {
            return Err(ServiceError::Validation("Name and email required".to_string()));
        }
        if !email.validate_email() {
            return Err(ServiceError::Validation("Email address is invalid".to_string()));
        }
        validate_password(&password).map_err(ServiceError::Validation)?;

        let password_hash = hash_password(&password)?;

        self.store
            .insert_user(CreateUser {
                name,
                email,
                password_hash,
                role,
                landlord_id,
            })
            .await
            .map_err(|err| {
                if err.is_conflict_on(USERS_EMAIL_KEY) {
                    warn!("Attempt to register an existing email");
                    ServiceError::Conflict("User with this email already exists".to_string())
                } else {
                    err.into()
                }
            })
    }
}
