//! PostgreSQL adapter for the storage ports
//!
//! A thin delegation layer over the model functions in [`crate::models`],
//! translating `sqlx::Error` into [`StoreError`] and turning the models'
//! conditional-update `None` into a [`ReviewTransition`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    ReviewStore, ReviewTransition, SessionStore, Store, StoreResult, TaskStore, UserStore,
};
use crate::db::pool::health_check;
use crate::models::{
    property_review::{
        CreatePropertyReview, Photo, PhotoSide, PropertyReview, ReviewFilter, Verdict,
    },
    session::{CreateSession, Session},
    submission::{CreateSubmission, DecideSubmission, Submission, SubmissionFilter},
    task::{CreateTask, Task, TaskFilter, TaskStatus},
    user::{CreateUser, User, UserFilter, UserRole, UserStatus},
    voucher::{CreateVoucher, Voucher, VoucherFilter},
};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Resolves why a conditional review update matched nothing
    async fn review_miss<T>(&self, id: Uuid) -> StoreResult<ReviewTransition<T>> {
        Ok(match PropertyReview::find_status(&self.pool, id).await? {
            Some(status) => ReviewTransition::AlreadyDecided(status),
            None => ReviewTransition::NotFound,
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(User::find_many(&self.pool, ids).await?)
    }

    async fn list_users(&self, filter: UserFilter) -> StoreResult<Vec<User>> {
        Ok(User::list(&self.pool, filter).await?)
    }

    async fn set_user_status(&self, id: Uuid, status: UserStatus) -> StoreResult<Option<User>> {
        Ok(User::update_status(&self.pool, id, status).await?)
    }

    async fn count_users(&self, role: UserRole) -> StoreResult<i64> {
        Ok(User::count_by_role(&self.pool, role).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, data: CreateSession) -> StoreResult<Session> {
        Ok(Session::create(&self.pool, data).await?)
    }

    async fn find_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Session>> {
        Ok(Session::find_active(&self.pool, token_hash, now).await?)
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        Ok(Session::delete_by_token_hash(&self.pool, token_hash).await?)
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(Session::delete_by_user(&self.pool, user_id).await?)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(Session::delete_expired(&self.pool, now).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(Task::list(&self.pool, filter).await?)
    }

    async fn count_tasks(&self, status: TaskStatus) -> StoreResult<i64> {
        Ok(Task::count_by_status(&self.pool, status).await?)
    }

    async fn insert_submission(&self, data: CreateSubmission) -> StoreResult<Option<Submission>> {
        Ok(Submission::create(&self.pool, data).await?)
    }

    async fn find_submission(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        Ok(Submission::find_by_id(&self.pool, id).await?)
    }

    async fn list_submissions(&self, filter: SubmissionFilter) -> StoreResult<Vec<Submission>> {
        Ok(Submission::list(&self.pool, filter).await?)
    }

    async fn decide_submission(
        &self,
        id: Uuid,
        data: DecideSubmission,
    ) -> StoreResult<Option<Submission>> {
        Ok(Submission::decide(&self.pool, id, data).await?)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert_review(&self, data: CreatePropertyReview) -> StoreResult<PropertyReview> {
        Ok(PropertyReview::create(&self.pool, data).await?)
    }

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<PropertyReview>> {
        Ok(PropertyReview::find_by_id(&self.pool, id).await?)
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> StoreResult<Vec<PropertyReview>> {
        Ok(PropertyReview::list(&self.pool, filter).await?)
    }

    async fn append_photos(
        &self,
        id: Uuid,
        side: PhotoSide,
        photos: Vec<Photo>,
    ) -> StoreResult<ReviewTransition<PropertyReview>> {
        match PropertyReview::append_photos(&self.pool, id, side, &photos).await? {
            Some(review) => Ok(ReviewTransition::Applied(review)),
            None => self.review_miss(id).await,
        }
    }

    async fn apply_verdict(
        &self,
        id: Uuid,
        verdict: Verdict,
        voucher: Option<CreateVoucher>,
    ) -> StoreResult<ReviewTransition<(PropertyReview, Option<Voucher>)>> {
        match PropertyReview::apply_verdict(&self.pool, id, verdict, voucher).await? {
            Some(applied) => Ok(ReviewTransition::Applied(applied)),
            None => self.review_miss(id).await,
        }
    }

    async fn list_vouchers(&self, filter: VoucherFilter) -> StoreResult<Vec<Voucher>> {
        Ok(Voucher::list(&self.pool, filter).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
