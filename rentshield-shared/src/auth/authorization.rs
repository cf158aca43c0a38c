//! Role-based authorization
//!
//! Every protected operation is named by an [`Operation`], and which roles may
//! perform it is a single lookup in [`CAPABILITIES`]. Ownership ("only the
//! landlord that owns this task") is checked separately with
//! [`require_owner`] once the entity has been loaded.
//!
//! # Example
//!
//! ```
//! use rentshield_shared::auth::authorization::{is_permitted, Operation};
//! use rentshield_shared::models::user::UserRole;
//!
//! assert!(is_permitted(Operation::RenderVerdict, UserRole::Admin));
//! assert!(!is_permitted(Operation::RenderVerdict, UserRole::Landlord));
//! ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Authorization failures
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Role {role} may not {operation}")]
    RoleNotPermitted { operation: Operation, role: UserRole },

    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// Protected operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ManageUsers,
    ListOwnTenants,
    ViewStats,
    CreateTask,
    ViewTasks,
    SubmitEvidence,
    DecideSubmission,
    ViewSubmissions,
    CreateReview,
    ViewReviews,
    UploadLandlordPhotos,
    UploadTenantPhotos,
    RenderVerdict,
    ViewVouchers,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ManageUsers => "manage users",
            Operation::ListOwnTenants => "list their tenants",
            Operation::ViewStats => "view dashboard stats",
            Operation::CreateTask => "create tasks",
            Operation::ViewTasks => "view tasks",
            Operation::SubmitEvidence => "submit evidence",
            Operation::DecideSubmission => "decide submissions",
            Operation::ViewSubmissions => "view submissions",
            Operation::CreateReview => "create property reviews",
            Operation::ViewReviews => "view property reviews",
            Operation::UploadLandlordPhotos => "upload landlord photos",
            Operation::UploadTenantPhotos => "upload tenant photos",
            Operation::RenderVerdict => "render verdicts",
            Operation::ViewVouchers => "view vouchers",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const ANY_ROLE: &[UserRole] = &[UserRole::Admin, UserRole::Landlord, UserRole::Tenant];

/// Which roles may perform each operation
pub const CAPABILITIES: &[(Operation, &[UserRole])] = &[
    (Operation::ManageUsers, &[UserRole::Admin]),
    (Operation::ListOwnTenants, &[UserRole::Landlord]),
    (Operation::ViewStats, &[UserRole::Admin]),
    (Operation::CreateTask, &[UserRole::Landlord]),
    (Operation::ViewTasks, ANY_ROLE),
    (Operation::SubmitEvidence, &[UserRole::Tenant]),
    (Operation::DecideSubmission, &[UserRole::Landlord, UserRole::Admin]),
    (Operation::ViewSubmissions, ANY_ROLE),
    (Operation::CreateReview, &[UserRole::Landlord]),
    (Operation::ViewReviews, ANY_ROLE),
    (Operation::UploadLandlordPhotos, &[UserRole::Landlord]),
    (Operation::UploadTenantPhotos, &[UserRole::Tenant]),
    (Operation::RenderVerdict, &[UserRole::Admin]),
    (Operation::ViewVouchers, ANY_ROLE),
];

/// Whether `role` may perform `operation`
///
/// Operations missing from the table are denied.
pub fn is_permitted(operation: Operation, role: UserRole) -> bool {
    CAPABILITIES
        .iter()
        .find(|(op, _)| *op == operation)
        .is_some_and(|(_, roles)| roles.contains(&role))
}

/// Fails unless the caller's role may perform `operation`
pub fn require(auth: &AuthContext, operation: Operation) -> Result<(), AuthzError> {
    if !is_permitted(operation, auth.role) {
        return Err(AuthzError::RoleNotPermitted {
            operation,
            role: auth.role,
        });
    }

    Ok(())
}

/// Fails unless the caller is `owner_id`
pub fn require_owner(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != owner_id {
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

/// Fails unless the caller is `owner_id` or an admin
pub fn require_owner_or_admin(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.is_admin() {
        return Ok(());
    }
    require_owner(auth, owner_id)
}
