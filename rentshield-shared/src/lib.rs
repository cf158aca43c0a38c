//! # RentShield Shared Library
//!
//! Domain types, persistence and workflow engines used by the RentShield API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migrations
//! - `store`: Storage ports with PostgreSQL and in-memory adapters
//! - `auth`: Passwords, session tokens, and the authorization gate
//! - `services`: Session, identity, task and property-review engines

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the RentShield shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
