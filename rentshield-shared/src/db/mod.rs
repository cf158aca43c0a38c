//! Database lifecycle: connection pool and embedded migrations
//!
//! Queries themselves live with the models in [`crate::models`].

pub mod migrations;
pub mod pool;
