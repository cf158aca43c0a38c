//! # RentShield API Server Library
//!
//! HTTP surface of the RentShield workflow service: session login, user
//! administration, tasks and submissions, property reviews and vouchers.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors with JSON rejections
//! - `middleware`: Session authentication and security headers
//! - `routes`: API route handlers
//! - `sweeper`: Expired-session cleanup task

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod sweeper;
