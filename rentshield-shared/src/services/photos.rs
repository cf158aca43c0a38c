//! Photo intake
//!
//! Uploaded files are handed to a [`PhotoIntake`], which returns one stable
//! reference URL per file. The engines only ever store those references.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::ServiceResult;
use crate::models::property_review::PhotoSide;

/// One uploaded file
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl PhotoUpload {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            content_type: None,
            bytes: bytes.into(),
        }
    }
}

/// Turns uploads into stored references
#[async_trait]
pub trait PhotoIntake: Send + Sync {
    /// Stores `uploads` and returns one URL per upload, in order
    async fn store(
        &self,
        review_id: Uuid,
        side: PhotoSide,
        uploads: &[PhotoUpload],
        at: DateTime<Utc>,
    ) -> ServiceResult<Vec<String>>;
}

/// Intake that assigns `/photos/{side}-{review}-{millis}-{n}.jpg` references
/// without persisting file contents
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferencePhotoIntake;

#[async_trait]
impl PhotoIntake for ReferencePhotoIntake {
    async fn store(
        &self,
        review_id: Uuid,
        side: PhotoSide,
        uploads: &[PhotoUpload],
        at: DateTime<Utc>,
    ) -> ServiceResult<Vec<String>> {
        let millis = at.timestamp_millis();
        Ok((0..uploads.len())
            .map(|i| format!("/photos/{}-{}-{}-{}.jpg", side.as_str(), review_id, millis, i))
            .collect())
    }
}
