//! Workflow engines
//!
//! - [`sessions::SessionManager`]: login, token resolution, logout
//! - [`identity::IdentityService`]: account administration and name lookup
//! - [`tasks::TaskEngine`]: tasks and evidence submissions
//! - [`reviews::ReviewEngine`]: property reviews, verdicts, vouchers
//!
//! Every operation takes the caller's [`AuthContext`](crate::auth::middleware::AuthContext),
//! checks it against the capability table, and fails with a [`error::ServiceError`].

pub mod error;
pub mod identity;
pub mod photos;
pub mod reviews;
pub mod sessions;
pub mod tasks;
pub mod vouchers;

#[cfg(test)]
pub(crate) mod testing;
