//! Storage ports for the workflow engines
//!
//! The engines in [`crate::services`] never talk to a database directly. They
//! depend on the async ports defined here, bundled behind [`Store`] and shared
//! as [`SharedStore`]. Two adapters exist:
//!
//! - [`postgres::PgStore`]: sqlx over a `PgPool`, delegating to the models
//! - [`memory::MemoryStore`]: `RwLock`-guarded maps for tests and local runs
//!
//! # Atomicity
//!
//! Every mutation is a single atomic store operation:
//!
//! - `insert_submission` writes the submission and forces the parent task to
//!   `submitted` together
//! - `decide_submission` writes the decision and mirrors it onto the task
//!   together
//! - `append_photos` appends to the existing list only while the review is
//!   pending
//! - `apply_verdict` is a compare-and-set on the pending status, with any
//!   voucher inserted and linked in the same step

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    property_review::{
        CreatePropertyReview, Photo, PhotoSide, PropertyReview, ReviewFilter, ReviewStatus, Verdict,
    },
    session::{CreateSession, Session},
    submission::{CreateSubmission, DecideSubmission, Submission, SubmissionFilter},
    task::{CreateTask, Task, TaskFilter, TaskStatus},
    user::{CreateUser, User, UserFilter, UserRole, UserStatus},
    voucher::{CreateVoucher, Voucher, VoucherFilter},
};

pub mod memory;
pub mod postgres;

/// Unique constraint on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Unique constraint on `sessions.token_hash`
pub const SESSIONS_TOKEN_HASH_KEY: &str = "sessions_token_hash_key";

/// Unique constraint on `vouchers.voucher_code`
pub const VOUCHERS_CODE_KEY: &str = "vouchers_voucher_code_key";

/// Unique constraint on `vouchers.property_review_id`
pub const VOUCHERS_REVIEW_KEY: &str = "vouchers_property_review_id_key";

/// Storage failure
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constraint name
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// The backend failed or timed out
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is a conflict on the named constraint
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, StoreError::Conflict(name) if name == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a write that is conditional on a review still being pending
#[derive(Debug, Clone)]
pub enum ReviewTransition<T> {
    /// The write happened
    Applied(T),

    /// No review with that id
    NotFound,

    /// The review already left `pending_admin_review`
    AlreadyDecided(ReviewStatus),
}

/// Users and their account status
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; `Conflict(USERS_EMAIL_KEY)` on a duplicate email
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Looks up by normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Batch lookup; unknown ids are skipped
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    /// Newest first
    async fn list_users(&self, filter: UserFilter) -> StoreResult<Vec<User>>;

    async fn set_user_status(&self, id: Uuid, status: UserStatus) -> StoreResult<Option<User>>;

    async fn count_users(&self, role: UserRole) -> StoreResult<i64>;
}

/// Sessions keyed by token hash
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, data: CreateSession) -> StoreResult<Session>;

    /// Only returns a session whose expiry is strictly after `now`
    async fn find_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Session>>;

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool>;

    async fn delete_user_sessions(&self, user_id: Uuid) -> StoreResult<u64>;

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

/// Tasks and submissions
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Newest first
    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>>;

    async fn count_tasks(&self, status: TaskStatus) -> StoreResult<i64>;

    /// Inserts a pending submission and forces its task to `submitted`
    ///
    /// Returns None (and writes nothing) if the task doesn't exist.
    async fn insert_submission(&self, data: CreateSubmission) -> StoreResult<Option<Submission>>;

    async fn find_submission(&self, id: Uuid) -> StoreResult<Option<Submission>>;

    /// Newest first
    async fn list_submissions(&self, filter: SubmissionFilter) -> StoreResult<Vec<Submission>>;

    /// Records the decision and mirrors it onto the parent task
    async fn decide_submission(
        &self,
        id: Uuid,
        data: DecideSubmission,
    ) -> StoreResult<Option<Submission>>;
}

/// Property reviews and vouchers
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, data: CreatePropertyReview) -> StoreResult<PropertyReview>;

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<PropertyReview>>;

    /// Newest first
    async fn list_reviews(&self, filter: ReviewFilter) -> StoreResult<Vec<PropertyReview>>;

    /// Appends to one side's photo list while the review is pending
    async fn append_photos(
        &self,
        id: Uuid,
        side: PhotoSide,
        photos: Vec<Photo>,
    ) -> StoreResult<ReviewTransition<PropertyReview>>;

    /// Moves a pending review to its verdict status, issuing `voucher` atomically
    async fn apply_verdict(
        &self,
        id: Uuid,
        verdict: Verdict,
        voucher: Option<CreateVoucher>,
    ) -> StoreResult<ReviewTransition<(PropertyReview, Option<Voucher>)>>;

    /// Most recently issued first
    async fn list_vouchers(&self, filter: VoucherFilter) -> StoreResult<Vec<Voucher>>;
}

/// Every port the engines need, plus a connectivity probe
#[async_trait]
pub trait Store: UserStore + SessionStore + TaskStore + ReviewStore {
    /// Short name of the backend, for health reporting
    fn backend(&self) -> &'static str;

    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Store handle shared by the engines
pub type SharedStore = Arc<dyn Store>;
