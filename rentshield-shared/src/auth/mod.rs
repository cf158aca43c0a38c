//! Authentication and authorization primitives
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing
//! - [`session_token`]: opaque session token generation and hashing
//! - [`middleware`]: the per-request [`middleware::AuthContext`] and the
//!   session cookie
//! - [`authorization`]: the (operation, role) capability table and ownership
//!   checks

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod session_token;
