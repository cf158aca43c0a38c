//! Property-review engine: photo evidence, admin verdicts, voucher issuance
//!
//! ```text
//! pending_admin_review ──thumbs_up──▶ approved  (+ voucher when a type is given)
//!                      └─thumbs_down─▶ rejected
//! ```
//!
//! Both terminal states are final. Photo uploads and verdicts against a review
//! that already left `pending_admin_review` fail with `Conflict`.

use chrono::Utc;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::identity::{name_or_placeholder, IdentityLookup};
use super::photos::{PhotoIntake, PhotoUpload};
use super::tasks::require_own_tenant;
use super::vouchers::{generate_voucher_code, voucher_label};
use crate::auth::{
    authorization::{require, Operation},
    middleware::AuthContext,
};
use crate::models::{
    property_review::{
        CreatePropertyReview, Photo, PhotoSide, PropertyReview, ReviewFilter, ReviewStatus,
        Verdict,
    },
    user::UserRole,
    voucher::{CreateVoucher, Voucher, VoucherFilter},
};
use crate::store::{ReviewTransition, SharedStore, VOUCHERS_CODE_KEY};

/// Attempts at drawing a fresh voucher code before giving up
const VOUCHER_CODE_ATTEMPTS: usize = 3;

const ALREADY_DECIDED: &str = "Property review already decided";

/// Input for opening a review
#[derive(Debug, Clone, Default)]
pub struct NewReview {
    pub tenant_id: Option<Uuid>,
    pub landlord_note: Option<String>,
}

/// Review with the names of both parties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: PropertyReview,
    pub landlord_name: String,
    pub tenant_name: String,
}

/// Result of a verdict
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictOutcome {
    pub status: ReviewStatus,
    pub admin_verdict: Verdict,
    pub voucher_id: Option<Uuid>,

    #[serde(skip)]
    pub review: PropertyReview,

    #[serde(skip)]
    pub voucher: Option<Voucher>,
}

/// Property-review workflow
#[derive(Clone)]
pub struct ReviewEngine {
    store: SharedStore,
    identity: Arc<dyn IdentityLookup>,
    photos: Arc<dyn PhotoIntake>,
}

impl ReviewEngine {
    pub fn new(
        store: SharedStore,
        identity: Arc<dyn IdentityLookup>,
        photos: Arc<dyn PhotoIntake>,
    ) -> Self {
        Self {
            store,
            identity,
            photos,
        }
    }

    /// Opens a review for one of the caller's tenants
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the caller is a landlord, or if the tenant is
    ///   managed by another landlord
    /// - `Validation` if `tenantId` is missing or doesn't name a tenant
    pub async fn create_review(
        &self,
        actor: &AuthContext,
        input: NewReview,
    ) -> ServiceResult<PropertyReview> {
        require(actor, Operation::CreateReview)?;

        let tenant_id = input
            .tenant_id
            .ok_or_else(|| ServiceError::Validation("tenantId is required".to_string()))?;
        require_own_tenant(&self.store, actor, tenant_id).await?;

        let landlord_note = input
            .landlord_note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());

        let review = self
            .store
            .insert_review(CreatePropertyReview {
                tenant_id,
                landlord_id: actor.user_id,
                landlord_note,
            })
            .await?;

        info!(review_id = %review.id, landlord_id = %actor.user_id, tenant_id = %tenant_id, "Property review opened");
        Ok(review)
    }

    /// Fetches one review with both parties' names
    pub async fn get_review(&self, actor: &AuthContext, id: Uuid) -> ServiceResult<ReviewView> {
        require(actor, Operation::ViewReviews)?;

        let review = self
            .store
            .find_review(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Property review"))?;

        if !actor.is_admin()
            && actor.user_id != review.landlord_id
            && actor.user_id != review.tenant_id
        {
            return Err(ServiceError::Forbidden(
                "Not authorized to access this property review".to_string(),
            ));
        }

        let names = self.names(&[review.landlord_id, review.tenant_id]).await;
        Ok(enrich_review(review, &names))
    }

    /// Lists reviews, newest first, scoped to the caller
    pub async fn list_reviews(&self, actor: &AuthContext) -> ServiceResult<Vec<ReviewView>> {
        require(actor, Operation::ViewReviews)?;

        let filter = match actor.role {
            UserRole::Admin => ReviewFilter::default(),
            UserRole::Landlord => ReviewFilter {
                landlord_id: Some(actor.user_id),
                tenant_id: None,
            },
            UserRole::Tenant => ReviewFilter {
                landlord_id: None,
                tenant_id: Some(actor.user_id),
            },
        };

        let reviews = self.store.list_reviews(filter).await?;

        let ids: Vec<Uuid> = reviews
            .iter()
            .flat_map(|r| [r.landlord_id, r.tenant_id])
            .collect();
        let names = self.names(&ids).await;

        Ok(reviews
            .into_iter()
            .map(|r| enrich_review(r, &names))
            .collect())
    }

    /// Appends uploads to the caller's side of a pending review
    ///
    /// The landlord side accepts only the owning landlord, the tenant side only
    /// the named tenant. Returns the number of photos appended.
    ///
    /// # Errors
    ///
    /// - `Forbidden` for the wrong role or party
    /// - `NotFound` if the review doesn't exist
    /// - `Conflict` once the review has a verdict
    pub async fn append_photos(
        &self,
        actor: &AuthContext,
        review_id: Uuid,
        side: PhotoSide,
        uploads: Vec<PhotoUpload>,
    ) -> ServiceResult<usize> {
        let operation = match side {
            PhotoSide::Landlord => Operation::UploadLandlordPhotos,
            PhotoSide::Tenant => Operation::UploadTenantPhotos,
        };
        require(actor, operation)?;

        let review = self
            .store
            .find_review(review_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Property review"))?;

        let party = match side {
            PhotoSide::Landlord => review.landlord_id,
            PhotoSide::Tenant => review.tenant_id,
        };
        if party != actor.user_id {
            warn!(review_id = %review_id, user_id = %actor.user_id, side = side.as_str(), "Upload by unrelated user");
            return Err(ServiceError::Forbidden(
                "Not authorized to upload photos to this property review".to_string(),
            ));
        }

        if !review.status.is_pending() {
            return Err(ServiceError::Conflict(ALREADY_DECIDED.to_string()));
        }

        if uploads.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let urls = self.photos.store(review_id, side, &uploads, now).await?;
        let photos: Vec<Photo> = urls
            .into_iter()
            .map(|url| Photo {
                url,
                uploaded_at: now,
                uploaded_by: actor.user_id,
            })
            .collect();
        let count = photos.len();

        match self.store.append_photos(review_id, side, photos).await? {
            ReviewTransition::Applied(_) => {
                info!(review_id = %review_id, side = side.as_str(), count, "Photos appended");
                Ok(count)
            }
            ReviewTransition::NotFound => Err(ServiceError::not_found("Property review")),
            ReviewTransition::AlreadyDecided(_) => {
                Err(ServiceError::Conflict(ALREADY_DECIDED.to_string()))
            }
        }
    }

    /// Resolves a pending review, issuing a voucher on `thumbs_up` when a
    /// voucher type is supplied
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the caller is an admin
    /// - `Validation` for an unknown verdict or a blank voucher type
    /// - `NotFound` if the review doesn't exist
    /// - `Conflict` if the review already has a verdict
    pub async fn render_verdict(
        &self,
        actor: &AuthContext,
        review_id: Uuid,
        verdict: &str,
        voucher_type: Option<&str>,
    ) -> ServiceResult<VerdictOutcome> {
        require(actor, Operation::RenderVerdict)?;

        let verdict: Verdict = verdict.parse().map_err(ServiceError::Validation)?;

        // Only a thumbs up issues a voucher; a blank type there is a client error
        let voucher_type = match voucher_type.map(str::trim) {
            Some("") if verdict == Verdict::ThumbsUp => {
                return Err(ServiceError::Validation(
                    "voucherType must not be blank".to_string(),
                ));
            }
            Some(t) if verdict == Verdict::ThumbsUp => Some(t),
            _ => None,
        };

        let review = self
            .store
            .find_review(review_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Property review"))?;

        let mut attempt = 0;
        let (review, voucher) = loop {
            attempt += 1;

            let voucher = voucher_type.map(|voucher_type| CreateVoucher {
                tenant_id: review.tenant_id,
                property_review_id: review_id,
                voucher_type: voucher_type.to_string(),
                voucher_type_label: voucher_label(voucher_type),
                voucher_code: generate_voucher_code(),
                issued_by_id: actor.user_id,
            });

            match self.store.apply_verdict(review_id, verdict, voucher).await {
                Ok(ReviewTransition::Applied(applied)) => break applied,
                Ok(ReviewTransition::NotFound) => {
                    return Err(ServiceError::not_found("Property review"))
                }
                Ok(ReviewTransition::AlreadyDecided(status)) => {
                    warn!(review_id = %review_id, status = status.as_str(), "Verdict on decided review");
                    return Err(ServiceError::Conflict(ALREADY_DECIDED.to_string()));
                }
                Err(err)
                    if err.is_conflict_on(VOUCHERS_CODE_KEY)
                        && attempt < VOUCHER_CODE_ATTEMPTS =>
                {
                    debug!(review_id = %review_id, attempt, "Voucher code collision; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        };

        info!(
            review_id = %review_id,
            verdict = verdict.as_str(),
            admin_id = %actor.user_id,
            "Verdict rendered"
        );
        if let Some(voucher) = &voucher {
            info!(
                voucher_id = %voucher.id,
                tenant_id = %voucher.tenant_id,
                voucher_type = %voucher.voucher_type,
                "Voucher issued"
            );
        }

        Ok(VerdictOutcome {
            status: review.status,
            admin_verdict: verdict,
            voucher_id: review.voucher_id,
            review,
            voucher,
        })
    }

    /// Vouchers visible to the caller: all for admins, own for tenants, none
    /// for landlords
    pub async fn list_vouchers(&self, actor: &AuthContext) -> ServiceResult<Vec<Voucher>> {
        require(actor, Operation::ViewVouchers)?;

        let filter = match actor.role {
            UserRole::Admin => VoucherFilter::default(),
            UserRole::Tenant => VoucherFilter {
                tenant_id: Some(actor.user_id),
            },
            UserRole::Landlord => return Ok(Vec::new()),
        };

        Ok(self.store.list_vouchers(filter).await?)
    }

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

fn enrich_review(review: PropertyReview, names: &HashMap<Uuid, String>) -> ReviewView {
    ReviewView {
        landlord_name: name_or_placeholder(names, review.landlord_id),
        tenant_name: name_or_placeholder(names, review.tenant_id),
        review,
    }
}
