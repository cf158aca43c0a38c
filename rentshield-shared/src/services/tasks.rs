//! Task engine: tasks, evidence submissions, and landlord decisions
//!
//! ```text
//! open ──submit──▶ submitted ──decide──▶ approved | rejected
//! ```
//!
//! Submitting is allowed from any task status and always forces the task to
//! `submitted`. Deciding a submission mirrors the decision onto the task
//! unconditionally, so the task reflects the most recent decision even when
//! older submissions are still pending.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::identity::{name_or_placeholder, IdentityLookup};
use crate::auth::{
    authorization::{require, require_owner_or_admin, Operation},
    middleware::AuthContext,
};
use crate::models::{
    submission::{CreateSubmission, DecideSubmission, Decision, Submission, SubmissionFilter},
    task::{default_deadline, CreateTask, Task, TaskFilter},
    user::UserRole,
};
use crate::store::SharedStore;

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub tenant_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,

    /// Defaults to 0
    pub reward_amount: Option<i64>,

    /// Defaults to 14 days from now
    pub deadline: Option<DateTime<Utc>>,
}

/// Admin-only listing filter; ignored for everyone else
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskQuery {
    pub role: Option<UserRole>,
    pub user_id: Option<Uuid>,
}

/// Task with the names of both parties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub landlord_name: String,
    pub tenant_name: String,
}

/// Submission with the submitting tenant's name
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    #[serde(flatten)]
    pub submission: Submission,
    pub tenant_name: String,
}

/// Task and submission workflow
#[derive(Clone)]
pub struct TaskEngine {
    store: SharedStore,
    identity: Arc<dyn IdentityLookup>,
}

impl TaskEngine {
    pub fn new(store: SharedStore, identity: Arc<dyn IdentityLookup>) -> Self {
        Self { store, identity }
    }

    /// Creates an `open` task for one of the caller's tenants
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the caller is a landlord, or if the tenant is
    ///   managed by another landlord
    /// - `Validation` for an empty title, missing or non-tenant `tenantId`, or
    ///   a negative reward
    pub async fn create_task(&self, actor: &AuthContext, input: NewTask) -> ServiceResult<Task> {
        require(actor, Operation::CreateTask)?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::Validation("title is required".to_string()));
        }

        let reward_amount = match input.reward_amount.unwrap_or(0) {
            amount if amount < 0 => {
                return Err(ServiceError::Validation(
                    "rewardAmount must not be negative".to_string(),
                ))
            }
            amount => i32::try_from(amount).map_err(|_| {
                ServiceError::Validation("rewardAmount is too large".to_string())
            })?,
        };

        let tenant_id = input
            .tenant_id
            .ok_or_else(|| ServiceError::Validation("tenantId is required".to_string()))?;
        require_own_tenant(&self.store, actor, tenant_id).await?;

        let task = self
            .store
            .insert_task(CreateTask {
                landlord_id: actor.user_id,
                tenant_id,
                property_id: input.property_id,
                title,
                description: input.description.unwrap_or_default(),
                reward_amount,
                deadline: input.deadline.unwrap_or_else(|| default_deadline(Utc::now())),
            })
            .await?;

        info!(task_id = %task.id, landlord_id = %task.landlord_id, tenant_id = %task.tenant_id, "Task created");
        Ok(task)
    }

    /// Fetches one task with both parties' names
    ///
    /// Visible to admins, the owning landlord, and the assigned tenant.
    pub async fn get_task(&self, actor: &AuthContext, id: Uuid) -> ServiceResult<TaskView> {
        require(actor, Operation::ViewTasks)?;

        let task = self
            .store
            .find_task(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;

        if !actor.is_admin() && actor.user_id != task.landlord_id && actor.user_id != task.tenant_id {
            return Err(ServiceError::Forbidden(
                "Not authorized to access this task".to_string(),
            ));
        }

        let names = self.names(&[task.landlord_id, task.tenant_id]).await;
        Ok(enrich_task(task, &names))
    }

    /// Lists tasks, newest first, with both parties' names
    ///
    /// Non-admins always see exactly their own tasks. Admins see all tasks,
    /// or one user's when `query` names a landlord or tenant.
    pub async fn list_tasks(
        &self,
        actor: &AuthContext,
        query: TaskQuery,
    ) -> ServiceResult<Vec<TaskView>> {
        require(actor, Operation::ViewTasks)?;

        let filter = match (actor.role, query.role, query.user_id) {
            (UserRole::Admin, Some(UserRole::Landlord), Some(id)) => TaskFilter {
                landlord_id: Some(id),
                tenant_id: None,
            },
            (UserRole::Admin, Some(UserRole::Tenant), Some(id)) => TaskFilter {
                landlord_id: None,
                tenant_id: Some(id),
            },
            (UserRole::Admin, _, _) => TaskFilter::default(),
            (UserRole::Landlord, _, _) => TaskFilter {
                landlord_id: Some(actor.user_id),
                tenant_id: None,
            },
            (UserRole::Tenant, _, _) => TaskFilter {
                landlord_id: None,
                tenant_id: Some(actor.user_id),
            },
        };

        let tasks = self.store.list_tasks(filter).await?;

        let ids: Vec<Uuid> = tasks
            .iter()
            .flat_map(|t| [t.landlord_id, t.tenant_id])
            .collect();
        let names = self.names(&ids).await;

        Ok(tasks.into_iter().map(|t| enrich_task(t, &names)).collect())
    }

    /// Records the assigned tenant's evidence and moves the task to `submitted`
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the caller is the task's tenant
    /// - `NotFound` if the task doesn't exist
    pub async fn submit_evidence(
        &self,
        actor: &AuthContext,
        task_id: Uuid,
        comment: Option<String>,
    ) -> ServiceResult<Submission> {
        require(actor, Operation::SubmitEvidence)?;

        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;

        if task.tenant_id != actor.user_id {
            warn!(task_id = %task_id, user_id = %actor.user_id, "Submission by unassigned tenant");
            return Err(ServiceError::Forbidden(
                "Only the assigned tenant may submit evidence".to_string(),
            ));
        }

        let submission = self
            .store
            .insert_submission(CreateSubmission {
                task_id,
                tenant_id: actor.user_id,
                comment: comment.unwrap_or_default(),
            })
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;

        info!(
            task_id = %task_id,
            submission_id = %submission.id,
            previous_status = task.status.as_str(),
            "Evidence submitted"
        );
        Ok(submission)
    }

    /// Approves or rejects a submission and mirrors the decision onto its task
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the caller is an admin or the landlord owning the task
    /// - `Validation` if `status` isn't `approved` or `rejected`
    /// - `NotFound` if the submission doesn't exist
    pub async fn decide_submission(
        &self,
        actor: &AuthContext,
        submission_id: Uuid,
        status: &str,
    ) -> ServiceResult<Submission> {
        require(actor, Operation::DecideSubmission)?;

        let decision: Decision = status.parse().map_err(ServiceError::Validation)?;

        let submission = self
            .store
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Submission"))?;

        let task = self
            .store
            .find_task(submission.task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))?;
        require_owner_or_admin(actor, task.landlord_id)?;

        let decided = self
            .store
            .decide_submission(
                submission_id,
                DecideSubmission {
                    decision,
                    reviewed_by: actor.user_id,
                    reviewed_at: Utc::now(),
                },
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("Submission"))?;

        info!(
            submission_id = %submission_id,
            task_id = %task.id,
            decision = decided.status.as_str(),
            reviewed_by = %actor.user_id,
            "Submission decided"
        );
        Ok(decided)
    }

    /// Lists submissions, newest first, with the tenant's name
    ///
    /// Admins see all, landlords see submissions on their own tasks, tenants
    /// see their own.
    pub async fn list_submissions(
        &self,
        actor: &AuthContext,
        task_id: Option<Uuid>,
    ) -> ServiceResult<Vec<SubmissionView>> {
        require(actor, Operation::ViewSubmissions)?;

        let mut filter = SubmissionFilter {
            task_id,
            ..SubmissionFilter::default()
        };
        match actor.role {
            UserRole::Admin => {}
            UserRole::Landlord => filter.landlord_id = Some(actor.user_id),
            UserRole::Tenant => filter.tenant_id = Some(actor.user_id),
        }

        let submissions = self.store.list_submissions(filter).await?;

        let ids: Vec<Uuid> = submissions.iter().map(|s| s.tenant_id).collect();
        let names = self.names(&ids).await;

        Ok(submissions
            .into_iter()
            .map(|submission| SubmissionView {
                tenant_name: name_or_placeholder(&names, submission.tenant_id),
                submission,
            })
            .collect())
    }

    /// One batch name lookup; failures degrade to placeholders
    async fn names(&self, ids: &[Uuid]) -> HashMap<Uuid, String> {
        match self.identity.display_names(ids).await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Name lookup failed; using placeholders");
                HashMap::new()
            }
        }
    }
}

fn enrich_task(task: Task, names: &HashMap<Uuid, String>) -> TaskView {
    TaskView {
        landlord_name: name_or_placeholder(names, task.landlord_id),
        tenant_name: name_or_placeholder(names, task.tenant_id),
        task,
    }
}

/// Checks that `tenant_id` is a tenant managed by the calling landlord
pub(crate) async fn require_own_tenant(
    store: &SharedStore,
    actor: &AuthContext,
    tenant_id: Uuid,
) -> ServiceResult<()> {
    let tenant = store
        .find_user(tenant_id)
        .await?
        .filter(|user| user.role == UserRole::Tenant)
        .ok_or_else(|| ServiceError::Validation("tenantId must reference a tenant".to_string()))?;

    if tenant.landlord_id != Some(actor.user_id) {
        warn!(tenant_id = %tenant_id, landlord_id = %actor.user_id, "Landlord targeted another landlord's tenant");
        return Err(ServiceError::Forbidden(
            "Tenant is not managed by this landlord".to_string(),
        ));
    }

    Ok(())
}
