//! Database models for RentShield
//!
//! Each model owns its PostgreSQL queries as associated functions taking a
//! `&PgPool`. Writes that span two tables (submission + task, verdict +
//! voucher) run inside a single transaction in the model that owns the
//! primary row.
//!
//! # Models
//!
//! - `user`: Accounts for admins, landlords, and tenants
//! - `session`: Opaque-token sessions (hash stored only)
//! - `task`: Landlord-assigned, reward-bearing tasks
//! - `submission`: Tenant evidence against a task
//! - `property_review`: Photo-backed property condition reviews
//! - `voucher`: Rewards issued on approved reviews
//!
//! # Example
//!
//! ```no_run
//! use rentshield_shared::models::user::{CreateUser, User, UserRole};
//! use rentshield_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! let landlord = User::create(&pool, CreateUser {
//!     name: "Lena Landlord".to_string(),
//!     email: "lena@example.com".to_string(),
//!     password_hash: "$argon2id$...".to_string(),
//!     role: UserRole::Landlord,
//!     landlord_id: None,
//! }).await?;
//! # let _ = landlord;
//! # Ok(())
//! # }
//! ```

pub mod property_review;
pub mod session;
pub mod submission;
pub mod task;
pub mod user;
pub mod voucher;
