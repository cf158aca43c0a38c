//! Fixture shared by the engine unit tests

use std::sync::Arc;
use uuid::Uuid;

use super::identity::{IdentityService, NewUser};
use super::photos::ReferencePhotoIntake;
use super::reviews::{NewReview, ReviewEngine};
use super::sessions::SessionManager;
use super::tasks::{NewTask, TaskEngine};
use crate::auth::middleware::AuthContext;
use crate::models::{property_review::PropertyReview, task::Task, user::UserRole};
use crate::store::{memory::MemoryStore, SharedStore};

/// Engines over a fresh [`MemoryStore`] with two landlords, each managing
/// one tenant, and an admin
pub(crate) struct Harness {
    pub sessions: SessionManager,
    pub identity: IdentityService,
    pub tasks: TaskEngine,
    pub reviews: ReviewEngine,
    pub admin: AuthContext,
    pub landlord: AuthContext,
    pub other_landlord: AuthContext,
    pub tenant: AuthContext,
    pub other_tenant: AuthContext,
}

impl Harness {
    pub async fn new() -> Self {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let sessions = SessionManager::new(store.clone());
        let identity = IdentityService::new(store.clone(), sessions.clone());
        let lookup = Arc::new(identity.clone());
        let tasks = TaskEngine::new(store.clone(), lookup.clone());
        let reviews = ReviewEngine::new(store, lookup, Arc::new(ReferencePhotoIntake));

        let admin = identity
            .bootstrap_admin("Ada Admin", "admin@example.com", "admin-pass")
            .await
            .unwrap()
            .unwrap();
        let admin = ctx(admin.id, UserRole::Admin);

        let landlord = account(
            &identity,
            &admin,
            "Lena Landlord",
            "lena@example.com",
            UserRole::Landlord,
            None,
        )
        .await;
        let other_landlord = account(
            &identity,
            &admin,
            "Mark Landlord",
            "mark@example.com",
            UserRole::Landlord,
            None,
        )
        .await;
        let tenant = account(
            &identity,
            &admin,
            "Tom Tenant",
            "tom@example.com",
            UserRole::Tenant,
            Some(landlord.user_id),
        )
        .await;
        let other_tenant = account(
            &identity,
            &admin,
            "Tia Tenant",
            "tia@example.com",
            UserRole::Tenant,
            Some(other_landlord.user_id),
        )
        .await;

        Self {
            sessions,
            identity,
            tasks,
            reviews,
            admin,
            landlord,
            other_landlord,
            tenant,
            other_tenant,
        }
    }

    /// Task from `landlord` to `tenant`
    pub async fn task(&self, title: &str, reward: i64) -> Task {
        self.tasks
            .create_task(
                &self.landlord,
                NewTask {
                    tenant_id: Some(self.tenant.user_id),
                    title: title.to_string(),
                    reward_amount: Some(reward),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap()
    }

    /// Review by `landlord` about `tenant`, without a note
    pub async fn review(&self) -> PropertyReview {
        self.reviews
            .create_review(
                &self.landlord,
                NewReview {
                    tenant_id: Some(self.tenant.user_id),
                    landlord_note: None,
                },
            )
            .await
            .unwrap()
    }
}

async fn account(
    identity: &IdentityService,
    admin: &AuthContext,
    name: &str,
    email: &str,
    role: UserRole,
    landlord_id: Option<Uuid>,
) -> AuthContext {
    let input = NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "password-123".to_string(),
        role: Some(role),
        landlord_id,
    };
    let user = identity.create_user(admin, input).await.unwrap();
    ctx(user.id, role)
}

fn ctx(user_id: Uuid, role: UserRole) -> AuthContext {
    AuthContext::new(user_id, role, Uuid::new_v4())
}
