//! In-memory implementation of the storage ports
//!
//! All state sits behind one [`RwLock`], so every port method observes and
//! mutates a consistent snapshot: the multi-record writes (submission + task,
//! verdict + voucher) happen under a single write guard. Rows are kept in
//! insertion order and "newest first" listings walk them in reverse.
//!
//! Used by the test suites and selectable at runtime with
//! `STORE_BACKEND=memory`; nothing survives a restart.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    ReviewStore, ReviewTransition, SessionStore, Store, StoreError, StoreResult, TaskStore,
    UserStore, SESSIONS_TOKEN_HASH_KEY, USERS_EMAIL_KEY, VOUCHERS_CODE_KEY, VOUCHERS_REVIEW_KEY,
};
use crate::models::{
    property_review::{
        CreatePropertyReview, Photo, PhotoSide, PropertyReview, ReviewFilter, ReviewStatus,
        Verdict,
    },
    session::{CreateSession, Session},
    submission::{CreateSubmission, DecideSubmission, Submission, SubmissionFilter, SubmissionStatus},
    task::{CreateTask, Task, TaskFilter, TaskStatus},
    user::{normalize_email, CreateUser, User, UserFilter, UserRole, UserStatus},
    voucher::{CreateVoucher, Voucher, VoucherFilter, VoucherStatus},
};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    sessions: Vec<Session>,
    tasks: Vec<Task>,
    submissions: Vec<Submission>,
    reviews: Vec<PropertyReview>,
    vouchers: Vec<Voucher>,
}

/// Store holding everything in process memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }
}

fn pending_index(reviews: &[PropertyReview], id: Uuid) -> Option<usize> {
    reviews
        .iter()
        .position(|r| r.id == id && r.status.is_pending())
}

fn review_miss<T>(reviews: &[PropertyReview], id: Uuid) -> ReviewTransition<T> {
    match reviews.iter().find(|r| r.id == id) {
        Some(review) => ReviewTransition::AlreadyDecided(review.status),
        None => ReviewTransition::NotFound,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.write()?;

        let email = normalize_email(&data.email);
        if state.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(USERS_EMAIL_KEY.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email,
            password_hash: data.password_hash,
            role: data.role,
            landlord_id: data.landlord_id,
            status: UserStatus::Active,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        Ok(self.read()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self, filter: UserFilter) -> StoreResult<Vec<User>> {
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .rev()
            .filter(|u| filter.role.map_or(true, |role| u.role == role))
            .filter(|u| filter.landlord_id.map_or(true, |id| u.landlord_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn set_user_status(&self, id: Uuid, status: UserStatus) -> StoreResult<Option<User>> {
        let mut state = self.write()?;
        Ok(state.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.status = status;
            user.clone()
        }))
    }

    async fn count_users(&self, role: UserRole) -> StoreResult<i64> {
        let state = self.read()?;
        Ok(state.users.iter().filter(|u| u.role == role).count() as i64)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, data: CreateSession) -> StoreResult<Session> {
        let mut state = self.write()?;

        if state.sessions.iter().any(|s| s.token_hash == data.token_hash) {
            return Err(StoreError::Conflict(SESSIONS_TOKEN_HASH_KEY.to_string()));
        }

        let session = Session {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            role: data.role,
            token_hash: data.token_hash,
            expires_at: data.expires_at,
            created_at: Utc::now(),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Session>> {
        let state = self.read()?;
        Ok(state
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash && s.is_valid_at(now))
            .cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        let mut state = self.write()?;
        let before = state.sessions.len();
        state.sessions.retain(|s| s.token_hash != token_hash);
        Ok(state.sessions.len() < before)
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.write()?;
        let before = state.sessions.len();
        state.sessions.retain(|s| s.user_id != user_id);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.write()?;
        let before = state.sessions.len();
        state.sessions.retain(|s| s.is_valid_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            landlord_id: data.landlord_id,
            tenant_id: data.tenant_id,
            property_id: data.property_id,
            title: data.title,
            description: data.description,
            reward_amount: data.reward_amount,
            deadline: data.deadline,
            status: TaskStatus::Open,
            created_at: Utc::now(),
        };
        self.write()?.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .iter()
            .rev()
            .filter(|t| filter.landlord_id.map_or(true, |id| t.landlord_id == id))
            .filter(|t| filter.tenant_id.map_or(true, |id| t.tenant_id == id))
            .cloned()
            .collect())
    }

    async fn count_tasks(&self, status: TaskStatus) -> StoreResult<i64> {
        let state = self.read()?;
        Ok(state.tasks.iter().filter(|t| t.status == status).count() as i64)
    }

    async fn insert_submission(&self, data: CreateSubmission) -> StoreResult<Option<Submission>> {
        let mut state = self.write()?;

        let Some(task) = state.tasks.iter_mut().find(|t| t.id == data.task_id) else {
            return Ok(None);
        };
        task.status = TaskStatus::Submitted;

        let submission = Submission {
            id: Uuid::new_v4(),
            task_id: data.task_id,
            tenant_id: data.tenant_id,
            comment: data.comment,
            status: SubmissionStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        };
        state.submissions.push(submission.clone());
        Ok(Some(submission))
    }

    async fn find_submission(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        Ok(self.read()?.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_submissions(&self, filter: SubmissionFilter) -> StoreResult<Vec<Submission>> {
        let state = self.read()?;
        let owned_by = |submission: &Submission, landlord_id: Uuid| {
            state
                .tasks
                .iter()
                .any(|t| t.id == submission.task_id && t.landlord_id == landlord_id)
        };

        Ok(state
            .submissions
            .iter()
            .rev()
            .filter(|s| filter.task_id.map_or(true, |id| s.task_id == id))
            .filter(|s| filter.tenant_id.map_or(true, |id| s.tenant_id == id))
            .filter(|s| filter.landlord_id.map_or(true, |id| owned_by(s, id)))
            .cloned()
            .collect())
    }

    async fn decide_submission(
        &self,
        id: Uuid,
        data: DecideSubmission,
    ) -> StoreResult<Option<Submission>> {
        let mut state = self.write()?;

        let Some(submission) = state.submissions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        submission.status = data.decision.submission_status();
        submission.reviewed_by = Some(data.reviewed_by);
        submission.reviewed_at = Some(data.reviewed_at);
        let decided = submission.clone();

        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == decided.task_id) {
            task.status = data.decision.task_status();
        }

        Ok(Some(decided))
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, data: CreatePropertyReview) -> StoreResult<PropertyReview> {
        let now = Utc::now();
        let review = PropertyReview {
            id: Uuid::new_v4(),
            tenant_id: data.tenant_id,
            landlord_id: data.landlord_id,
            landlord_note: data.landlord_note,
            landlord_photos: Vec::new(),
            tenant_photos: Vec::new(),
            status: ReviewStatus::PendingAdminReview,
            admin_verdict: None,
            voucher_id: None,
            created_at: now,
            updated_at: now,
        };
        self.write()?.reviews.push(review.clone());
        Ok(review)
    }

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<PropertyReview>> {
        Ok(self.read()?.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> StoreResult<Vec<PropertyReview>> {
        let state = self.read()?;
        Ok(state
            .reviews
            .iter()
            .rev()
            .filter(|r| filter.landlord_id.map_or(true, |id| r.landlord_id == id))
            .filter(|r| filter.tenant_id.map_or(true, |id| r.tenant_id == id))
            .cloned()
            .collect())
    }

    async fn append_photos(
        &self,
        id: Uuid,
        side: PhotoSide,
        photos: Vec<Photo>,
    ) -> StoreResult<ReviewTransition<PropertyReview>> {
        let mut state = self.write()?;

        let Some(index) = pending_index(&state.reviews, id) else {
            return Ok(review_miss(&state.reviews, id));
        };

        let review = &mut state.reviews[index];
        match side {
            PhotoSide::Landlord => review.landlord_photos.extend(photos),
            PhotoSide::Tenant => review.tenant_photos.extend(photos),
        }
        review.updated_at = Utc::now();
        Ok(ReviewTransition::Applied(review.clone()))
    }

    async fn apply_verdict(
        &self,
        id: Uuid,
        verdict: Verdict,
        voucher: Option<CreateVoucher>,
    ) -> StoreResult<ReviewTransition<(PropertyReview, Option<Voucher>)>> {
        let mut state = self.write()?;
        let state = &mut *state;

        let Some(index) = pending_index(&state.reviews, id) else {
            return Ok(review_miss(&state.reviews, id));
        };

        // Check constraints before touching the review so a conflict leaves
        // nothing half-written.
        let issued = match voucher {
            Some(data) => {
                if state.vouchers.iter().any(|v| v.voucher_code == data.voucher_code) {
                    return Err(StoreError::Conflict(VOUCHERS_CODE_KEY.to_string()));
                }
                if state
                    .vouchers
                    .iter()
                    .any(|v| v.property_review_id == data.property_review_id)
                {
                    return Err(StoreError::Conflict(VOUCHERS_REVIEW_KEY.to_string()));
                }
                Some(Voucher {
                    id: Uuid::new_v4(),
                    tenant_id: data.tenant_id,
                    property_review_id: data.property_review_id,
                    voucher_type: data.voucher_type,
                    voucher_type_label: data.voucher_type_label,
                    voucher_code: data.voucher_code,
                    issued_by_id: data.issued_by_id,
                    issued_at: Utc::now(),
                    status: VoucherStatus::Active,
                })
            }
            None => None,
        };

        let review = &mut state.reviews[index];
        review.status = verdict.resulting_status();
        review.admin_verdict = Some(verdict);
        review.updated_at = Utc::now();
        if let Some(voucher) = &issued {
            review.voucher_id = Some(voucher.id);
            state.vouchers.push(voucher.clone());
        }

        Ok(ReviewTransition::Applied((review.clone(), issued)))
    }

    async fn list_vouchers(&self, filter: VoucherFilter) -> StoreResult<Vec<Voucher>> {
        let state = self.read()?;
        Ok(state
            .vouchers
            .iter()
            .rev()
            .filter(|v| filter.tenant_id.map_or(true, |id| v.tenant_id == id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}
