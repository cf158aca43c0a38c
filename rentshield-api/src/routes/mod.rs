//! API route handlers
//!
//! Organized by resource:
//!
//! - `health`: Health check endpoint
//! - `auth`: Login, logout, current user
//! - `users`: Account administration and tenant roster
//! - `stats`: Admin dashboard counters
//! - `tasks`: Tasks
//! - `submissions`: Evidence submissions and decisions
//! - `property_reviews`: Property reviews, photo uploads, verdicts
//! - `vouchers`: Issued vouchers

pub mod auth;
pub mod health;
pub mod property_reviews;
pub mod stats;
pub mod submissions;
pub mod tasks;
pub mod users;
pub mod vouchers;

use rentshield_shared::{
    auth::{
        authorization::{require, Operation},
        middleware::AuthContext,
    },
    services::error::ServiceError,
};
use tracing::warn;

use crate::error::ApiError;

/// Role gate for handlers that validate a body before calling an engine
///
/// Callers without the capability get 403 whatever they sent.
pub(crate) fn permit(auth: &AuthContext, operation: Operation) -> Result<(), ApiError> {
    require(auth, operation).map_err(|err| ServiceError::from(err).into())
}

/// Listing result that degrades to empty on dependency failures
///
/// Dashboards stay usable while storage is flaky; every other error
/// propagates.
pub(crate) fn degrade_listing<T>(
    resource: &str,
    result: Result<Vec<T>, ServiceError>,
) -> Result<Vec<T>, ApiError> {
    match result {
        Ok(items) => Ok(items),
        Err(err) if err.is_dependency() => {
            warn!(resource, error = %err, "Listing degraded to empty");
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}
